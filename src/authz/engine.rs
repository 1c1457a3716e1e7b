//! Authorization engine for the instances served by this process.
//!
//! One role assignment store document per instance lives in the role assignments
//! container as `/{instance_id}.json` (lower-cased). `initialize` loads or creates each
//! document, enriches the assignments and builds the lookup caches; decisions are
//! denied until it has completed. Mutations rewrite the full document before the
//! in-memory state is updated, so a failed write leaves both unchanged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::actions::ROLE_ASSIGNMENTS_READ;
use super::assignments::{RoleAssignment, RoleAssignmentCache, RoleAssignmentStore};
use super::evaluator::{self, RolesWithActions};
use super::request::{parse_for_authorization_request, ActionAuthorizationRequest, ActionAuthorizationResult};
use super::roles::get_role_definition;
use crate::config::AuthorizationSettings;
use crate::error::{AppError, AppResult};
use crate::resource::metadata::allowed_resource_types;
use crate::resource::names::{providers, types};
use crate::resource::ResourcePath;
use crate::storage::{SharedStorage, JSON_CONTENT_TYPE};

fn store_file(instance_id: &str) -> String { format!("/{}.json", instance_id.to_lowercase()) }

pub struct AuthorizationCore {
    settings: AuthorizationSettings,
    storage: SharedStorage,
    cancel: CancellationToken,
    // Both maps are keyed by the lower-cased instance id.
    stores: RwLock<HashMap<String, RoleAssignmentStore>>,
    caches: RwLock<HashMap<String, RoleAssignmentCache>>,
    initialized: AtomicBool,
    // Serializes document rewrites; held across the storage write.
    persist: tokio::sync::Mutex<()>,
}

impl AuthorizationCore {
    pub fn new(settings: AuthorizationSettings, storage: SharedStorage, cancel: CancellationToken) -> Self {
        Self {
            settings,
            storage,
            cancel,
            stores: RwLock::new(HashMap::new()),
            caches: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            persist: tokio::sync::Mutex::new(()),
        }
    }

    pub fn is_initialized(&self) -> bool { self.initialized.load(Ordering::Acquire) }

    pub fn instance_ids(&self) -> &[String] { &self.settings.instance_ids }

    /// Load or create every configured instance's store. A document that does not
    /// deserialize or belongs to another instance is logged and that instance is left
    /// without assignments. Storage failures abort initialization and are returned.
    pub async fn initialize(&self) -> AppResult<()> {
        match self.load_all().await {
            Ok(()) => {
                self.initialized.store(true, Ordering::Release);
                info!(target: "fllm::authz", "authorization core initialized for {} instance(s)", self.settings.instance_ids.len());
                Ok(())
            }
            Err(e) => {
                error!(target: "fllm::authz", "The authorization core failed to initialize: {}", e);
                Err(e)
            }
        }
    }

    async fn load_all(&self) -> AppResult<()> {
        let container = &self.settings.role_assignments_container;
        for instance_id in &self.settings.instance_ids {
            let file = store_file(instance_id);
            let mut store = if self.storage.file_exists(container, &file, &self.cancel).await? {
                let bytes = self.storage.read_file(container, &file, &self.cancel).await?;
                match serde_json::from_slice::<RoleAssignmentStore>(&bytes) {
                    Ok(store) if store.instance_id.eq_ignore_ascii_case(instance_id) => {
                        info!(target: "fllm::authz", "The role assignment store for instance {} has been loaded.", instance_id);
                        store
                    }
                    Ok(store) => {
                        error!(target: "fllm::authz", "The role assignment store file for instance {} is invalid: it belongs to instance {}.", instance_id, store.instance_id);
                        continue;
                    }
                    Err(e) => {
                        error!(target: "fllm::authz", "The role assignment store file for instance {} is invalid: {}", instance_id, e);
                        continue;
                    }
                }
            } else {
                let store = RoleAssignmentStore::new(instance_id.clone());
                self.write_store(&store).await?;
                info!(target: "fllm::authz", "The role assignment store for instance {} has been created.", instance_id);
                store
            };

            store.enrich_role_assignments();
            let key = instance_id.to_lowercase();
            self.caches.write().insert(key.clone(), RoleAssignmentCache::new(&store));
            self.stores.write().insert(key, store);
        }
        Ok(())
    }

    async fn write_store(&self, store: &RoleAssignmentStore) -> AppResult<()> {
        let bytes = serde_json::to_vec(store)?;
        self.storage
            .write_file(
                &self.settings.role_assignments_container,
                &store_file(&store.instance_id),
                &bytes,
                Some(JSON_CONTENT_TYPE),
                &self.cancel,
            )
            .await
    }

    fn ensure_initialized(&self) -> AppResult<()> {
        if !self.is_initialized() {
            return Err(AppError::io("not_initialized", "The authorization core is not initialized."));
        }
        Ok(())
    }

    fn served_key(&self, instance_id: &str) -> AppResult<String> {
        let key = instance_id.to_lowercase();
        if !self.stores.read().contains_key(&key) {
            return Err(AppError::not_found("unknown_instance", format!("Instance [{}] is not served by this authorization core.", instance_id)));
        }
        Ok(key)
    }

    /// Decide `request` for the instance named by the caller's route. Invalid input is
    /// returned as an error; a valid request the principal may not perform is `Ok(false)`.
    pub fn authorize(&self, instance_id: &str, request: &ActionAuthorizationRequest) -> AppResult<bool> {
        self.ensure_initialized()?;
        request.validate()?;
        let path = parse_for_authorization_request(&request.resource_path, &self.settings.instance_ids)?;
        let matches_route = path.instance_id().map_or(false, |i| i.eq_ignore_ascii_case(instance_id));
        if !matches_route {
            return Err(AppError::forbidden(
                "instance_mismatch",
                "The instance id from the controller route and the instance id from the authorization request do not match.",
            ));
        }
        Ok(self.action_allowed(&path, request))
    }

    /// `authorize` for callers that only want a verdict: every failure is a denial.
    pub fn process_authorization_request(&self, instance_id: &str, request: &ActionAuthorizationRequest) -> ActionAuthorizationResult {
        if let Ok(body) = serde_json::to_string(request) {
            debug!(target: "fllm::authz", "Authorization request: {}", body);
        }
        match self.authorize(instance_id, request) {
            Ok(authorized) => ActionAuthorizationResult { authorized },
            Err(e) => {
                error!(target: "fllm::authz", "The authorization core failed to process the authorization request: {}", e);
                ActionAuthorizationResult::denied()
            }
        }
    }

    /// Whether `principal_id` may submit authorization requests for the instance, i.e.
    /// may read its role assignments.
    pub fn allow_authorization_requests_processing(&self, instance_id: &str, principal_id: &str) -> bool {
        let resource_path = format!(
            "/instances/{}/providers/{}/{}",
            instance_id,
            providers::AUTHORIZATION,
            types::ROLE_ASSIGNMENTS
        );
        let Some(path) = ResourcePath::try_parse(
            &resource_path,
            &[providers::AUTHORIZATION],
            allowed_resource_types(providers::AUTHORIZATION),
            false,
        ) else {
            return false;
        };
        self.action_allowed(&path, &ActionAuthorizationRequest::new(ROLE_ASSIGNMENTS_READ, resource_path.as_str(), principal_id))
    }

    fn action_allowed(&self, path: &ResourcePath, request: &ActionAuthorizationRequest) -> bool {
        let Some(instance_id) = path.instance_id() else { return false };
        match self.caches.read().get(&instance_id.to_lowercase()) {
            Some(cache) => evaluator::action_allowed(cache, path, request),
            None => {
                warn!(target: "fllm::authz", "no role assignments are loaded for instance {}", instance_id);
                false
            }
        }
    }

    /// Role names and effective actions of the principal and its groups at `resource_path`.
    pub fn roles_with_actions(
        &self,
        instance_id: &str,
        principal_id: &str,
        security_group_ids: &[String],
        resource_path: &str,
    ) -> AppResult<RolesWithActions> {
        self.ensure_initialized()?;
        let path = parse_for_authorization_request(resource_path, &self.settings.instance_ids)?;
        if !path.instance_id().map_or(false, |i| i.eq_ignore_ascii_case(instance_id)) {
            return Err(AppError::forbidden("instance_mismatch", "The resource path belongs to a different instance."));
        }
        let key = instance_id.to_lowercase();
        let caches = self.caches.read();
        let Some(cache) = caches.get(&key) else { return Ok(RolesWithActions::default()) };
        let object_ids = std::iter::once(principal_id).chain(security_group_ids.iter().map(String::as_str));
        Ok(evaluator::roles_with_actions(cache, &path, object_ids))
    }

    pub fn get_role_assignments(&self, instance_id: &str) -> AppResult<Vec<RoleAssignment>> {
        self.ensure_initialized()?;
        let key = self.served_key(instance_id)?;
        Ok(self.stores.read().get(&key).map(|s| s.role_assignments.clone()).unwrap_or_default())
    }

    /// Create or replace the assignment with the same object id. The object id is
    /// derived from the name when empty; the role definition must be a known one.
    pub async fn upsert_role_assignment(&self, instance_id: &str, mut assignment: RoleAssignment) -> AppResult<RoleAssignment> {
        self.ensure_initialized()?;
        let key = self.served_key(instance_id)?;

        if assignment.name.trim().is_empty() || assignment.principal_id.trim().is_empty() {
            return Err(AppError::user("invalid_role_assignment", "A role assignment needs a name and a principal id."));
        }
        if get_role_definition(&assignment.role_definition_id).is_none() {
            return Err(AppError::user(
                "unknown_role_definition",
                format!("The role definition [{}] does not exist.", assignment.role_definition_id),
            ));
        }
        if assignment.object_id.is_empty() {
            assignment.object_id = ResourcePath::object_id(instance_id, providers::AUTHORIZATION, types::ROLE_ASSIGNMENTS, &assignment.name);
        }

        let _guard = self.persist.lock().await;
        let mut next = self.stores.read().get(&key).cloned().unwrap_or_default();
        assignment.enrich(&next.instance_id)?;

        let now = Utc::now();
        match next.role_assignments.iter_mut().find(|ra| ra.object_id == assignment.object_id) {
            Some(existing) => {
                assignment.created_on = existing.created_on;
                assignment.created_by = existing.created_by.clone();
                assignment.updated_on = Some(now);
                *existing = assignment.clone();
            }
            None => {
                assignment.created_on = Some(now);
                assignment.updated_on = Some(now);
                next.role_assignments.push(assignment.clone());
            }
        }

        self.write_store(&next).await?;
        self.caches.write().entry(key.clone()).or_default().add_or_update_role_assignment(assignment.clone());
        self.stores.write().insert(key, next);
        info!(target: "fllm::authz", "role assignment {} saved for principal {}", assignment.object_id, assignment.principal_id);
        Ok(assignment)
    }

    pub async fn delete_role_assignment(&self, instance_id: &str, object_id: &str) -> AppResult<RoleAssignment> {
        self.ensure_initialized()?;
        let key = self.served_key(instance_id)?;

        let _guard = self.persist.lock().await;
        let mut next = self.stores.read().get(&key).cloned().unwrap_or_default();
        let Some(pos) = next.role_assignments.iter().position(|ra| ra.object_id == object_id) else {
            return Err(AppError::not_found("role_assignment_missing", format!("The role assignment [{}] does not exist.", object_id)));
        };
        let removed = next.role_assignments.remove(pos);

        self.write_store(&next).await?;
        if let Some(cache) = self.caches.write().get_mut(&key) {
            cache.remove_role_assignment(object_id);
        }
        self.stores.write().insert(key, next);
        info!(target: "fllm::authz", "role assignment {} deleted", object_id);
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
