//! Runtime settings for the authorization core and the resource reference stores.
//! Defaults come from `Default`, a JSON document can replace them wholesale and
//! `FLLM_*` environment variables overlay individual values.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Settings consumed by `AuthorizationCore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthorizationSettings {
    /// FoundationaLLM instance ids served by this process (GUID strings).
    pub instance_ids: Vec<String>,
    /// Storage container holding one role assignment store document per instance.
    pub role_assignments_container: String,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            instance_ids: Vec::new(),
            role_assignments_container: "role-assignments".to_string(),
        }
    }
}

/// Settings consumed by `ResourceProviderResourceReferenceStore`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReferenceStoreSettings {
    pub storage_container: String,
    /// Wait before reloading from storage when a lookup misses locally.
    pub reload_delay_ms: u64,
}

impl Default for ReferenceStoreSettings {
    fn default() -> Self {
        Self { storage_container: "resource-provider".to_string(), reload_delay_ms: 10 }
    }
}

impl ReferenceStoreSettings {
    pub fn reload_delay(&self) -> std::time::Duration { std::time::Duration::from_millis(self.reload_delay_ms) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub authorization: AuthorizationSettings,
    pub references: ReferenceStoreSettings,
    /// Root directory used by `FileSystemStorage`.
    pub storage_root: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            authorization: AuthorizationSettings::default(),
            references: ReferenceStoreSettings::default(),
            storage_root: "./data".to_string(),
        }
    }
}

impl Settings {
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let settings: Settings = serde_json::from_str(text)
            .map_err(|e| AppError::user("invalid_settings", format!("Settings document is invalid: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::default().overlay(|k| std::env::var(k).ok())
    }

    /// Overlay values from a key lookup; split out from `from_env` so tests can feed a map.
    pub fn overlay<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> AppResult<Self> {
        if let Some(v) = lookup("FLLM_INSTANCE_IDS") {
            self.authorization.instance_ids = v
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
        }
        if let Some(v) = lookup("FLLM_STORAGE_ROOT") { self.storage_root = v; }
        if let Some(v) = lookup("FLLM_ROLE_ASSIGNMENTS_CONTAINER") { self.authorization.role_assignments_container = v; }
        if let Some(v) = lookup("FLLM_RESOURCE_CONTAINER") { self.references.storage_container = v; }
        if let Some(v) = lookup("FLLM_REFERENCE_RELOAD_DELAY_MS") {
            self.references.reload_delay_ms = v.trim().parse::<u64>().map_err(|_| {
                AppError::user("invalid_settings", format!("FLLM_REFERENCE_RELOAD_DELAY_MS must be a non-negative integer, got [{}]", v))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> AppResult<()> {
        for id in &self.authorization.instance_ids {
            if uuid::Uuid::parse_str(id).is_err() {
                return Err(AppError::user("invalid_settings", format!("Instance id [{}] is not a valid GUID", id)));
            }
        }
        if self.authorization.role_assignments_container.trim().is_empty() {
            return Err(AppError::user("invalid_settings", "Role assignments container must not be empty"));
        }
        if self.references.storage_container.trim().is_empty() {
            return Err(AppError::user("invalid_settings", "Resource provider storage container must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
