use super::*;
use std::collections::HashMap;

const INSTANCE: &str = "6fa496ce-d5c0-4e02-9223-06a98c9c0176";

#[test]
fn defaults_match_storage_conventions() {
    let s = Settings::default();
    assert_eq!(s.authorization.role_assignments_container, "role-assignments");
    assert_eq!(s.references.storage_container, "resource-provider");
    assert_eq!(s.references.reload_delay_ms, 10);
    assert_eq!(s.references.reload_delay(), std::time::Duration::from_millis(10));
    assert!(s.authorization.instance_ids.is_empty());
}

#[test]
fn overlay_reads_all_keys() {
    let mut env = HashMap::new();
    env.insert("FLLM_INSTANCE_IDS", format!(" {} , ", INSTANCE));
    env.insert("FLLM_STORAGE_ROOT", "/var/lib/fllm".to_string());
    env.insert("FLLM_ROLE_ASSIGNMENTS_CONTAINER", "rbac".to_string());
    env.insert("FLLM_RESOURCE_CONTAINER", "providers".to_string());
    env.insert("FLLM_REFERENCE_RELOAD_DELAY_MS", "25".to_string());

    let s = Settings::default().overlay(|k| env.get(k).cloned()).unwrap();
    assert_eq!(s.authorization.instance_ids, vec![INSTANCE.to_string()]);
    assert_eq!(s.storage_root, "/var/lib/fllm");
    assert_eq!(s.authorization.role_assignments_container, "rbac");
    assert_eq!(s.references.storage_container, "providers");
    assert_eq!(s.references.reload_delay_ms, 25);
}

#[test]
fn overlay_rejects_bad_values() {
    let err = Settings::default()
        .overlay(|k| if k == "FLLM_REFERENCE_RELOAD_DELAY_MS" { Some("soon".into()) } else { None })
        .unwrap_err();
    assert_eq!(err.http_status(), 400);

    let err = Settings::default()
        .overlay(|k| if k == "FLLM_INSTANCE_IDS" { Some("not-a-guid".into()) } else { None })
        .unwrap_err();
    assert_eq!(err.code_str(), "invalid_settings");
}

#[test]
fn json_document_fills_missing_sections_with_defaults() {
    let text = format!(r#"{{ "authorization": {{ "instance_ids": ["{}"] }} }}"#, INSTANCE);
    let s = Settings::from_json_str(&text).unwrap();
    assert_eq!(s.authorization.instance_ids.len(), 1);
    assert_eq!(s.authorization.role_assignments_container, "role-assignments");
    assert_eq!(s.references, ReferenceStoreSettings::default());

    assert!(Settings::from_json_str("{ not json").is_err());
}
