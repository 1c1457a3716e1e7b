//! Per-provider resource type schemas, built once and shared read-only.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use super::descriptor::{type_map, AllowedTypes, ResourceTypeAction, ResourceTypeDescriptor, ResourceTypeMap};
use super::names::{actions, providers, types};

fn check_name() -> ResourceTypeAction {
    ResourceTypeAction::on_resource_type(actions::CHECK_NAME)
        .with_allowed_types(AllowedTypes::post("ResourceName", "ResourceNameCheckResult"))
}

fn purge() -> ResourceTypeAction {
    ResourceTypeAction::on_resource(actions::PURGE).with_allowed_types(AllowedTypes::post("", "ResourceProviderActionResult"))
}

fn filter(model: &str) -> ResourceTypeAction {
    ResourceTypeAction::on_resource_type(actions::FILTER).with_allowed_types(AllowedTypes::post("ResourceFilter", model))
}

fn vectorization_result(action: &str) -> ResourceTypeAction {
    ResourceTypeAction::on_resource(action).with_allowed_types(AllowedTypes::post("", "VectorizationResult"))
}

fn agent_types() -> ResourceTypeMap {
    type_map([ResourceTypeDescriptor::crud(types::AGENTS, "AgentBase")
        .with_action(check_name())
        .with_action(purge())
        .with_sub_type(
            ResourceTypeDescriptor::new(types::AGENT_FILES)
                .with_allowed_types(AllowedTypes::get("ResourceProviderGetResult<AgentFile>"))
                .with_allowed_types(AllowedTypes::post("AgentFile", "ResourceProviderUpsertResult"))
                .with_allowed_types(AllowedTypes::delete()),
        )])
}

fn authorization_types() -> ResourceTypeMap {
    type_map([
        ResourceTypeDescriptor::crud(types::ROLE_ASSIGNMENTS, "RoleAssignment").with_action(filter("RoleAssignment")),
        ResourceTypeDescriptor::new(types::ROLE_DEFINITIONS)
            .with_allowed_types(AllowedTypes::get("ResourceProviderGetResult<RoleDefinition>")),
    ])
}

fn prompt_types() -> ResourceTypeMap {
    type_map([ResourceTypeDescriptor::crud(types::PROMPTS, "PromptBase").with_action(check_name()).with_action(purge())])
}

fn data_source_types() -> ResourceTypeMap {
    type_map([ResourceTypeDescriptor::crud(types::DATA_SOURCES, "DataSourceBase")
        .with_action(check_name())
        .with_action(filter("DataSourceBase"))
        .with_action(purge())])
}

fn configuration_types() -> ResourceTypeMap {
    type_map([
        ResourceTypeDescriptor::crud(types::APP_CONFIGURATIONS, "AppConfigurationKeyBase").with_action(check_name()),
        ResourceTypeDescriptor::crud(types::KEY_VAULT_SECRETS, "KeyVaultSecret"),
        ResourceTypeDescriptor::crud(types::API_ENDPOINT_CONFIGURATIONS, "APIEndpointConfiguration").with_action(check_name()),
    ])
}

fn vectorization_types() -> ResourceTypeMap {
    type_map([
        ResourceTypeDescriptor::crud(types::VECTORIZATION_PIPELINES, "VectorizationPipeline")
            .with_action(vectorization_result(actions::ACTIVATE))
            .with_action(vectorization_result(actions::DEACTIVATE))
            .with_action(purge()),
        ResourceTypeDescriptor::new(types::VECTORIZATION_REQUESTS)
            .with_allowed_types(AllowedTypes::get("VectorizationRequest"))
            .with_allowed_types(AllowedTypes::post("VectorizationRequest", "ResourceProviderUpsertResult"))
            .with_allowed_types(AllowedTypes::delete())
            .with_action(vectorization_result(actions::PROCESS)),
        ResourceTypeDescriptor::crud(types::CONTENT_SOURCE_PROFILES, "ContentSourceProfile").with_action(check_name()).with_action(purge()),
        ResourceTypeDescriptor::crud(types::TEXT_PARTITIONING_PROFILES, "TextPartitioningProfile").with_action(check_name()).with_action(purge()),
        ResourceTypeDescriptor::crud(types::TEXT_EMBEDDING_PROFILES, "TextEmbeddingProfile").with_action(check_name()).with_action(purge()),
        ResourceTypeDescriptor::crud(types::INDEXING_PROFILES, "IndexingProfile")
            .with_action(check_name())
            .with_action(filter("IndexingProfile"))
            .with_action(purge()),
    ])
}

fn attachment_types() -> ResourceTypeMap {
    type_map([ResourceTypeDescriptor::crud(types::ATTACHMENTS, "AttachmentFile").with_action(filter("AttachmentFile"))])
}

fn ai_model_types() -> ResourceTypeMap {
    type_map([ResourceTypeDescriptor::crud(types::AI_MODELS, "AIModelBase").with_action(check_name()).with_action(purge())])
}

fn azure_openai_types() -> ResourceTypeMap {
    type_map([
        ResourceTypeDescriptor::crud(types::ASSISTANT_USER_CONTEXTS, "AssistantUserContext").with_action(check_name()).with_action(purge()),
        ResourceTypeDescriptor::crud(types::FILE_USER_CONTEXTS, "FileUserContext").with_action(check_name()).with_action(purge()),
    ])
}

static REGISTRY: Lazy<BTreeMap<&'static str, ResourceTypeMap>> = Lazy::new(|| {
    BTreeMap::from([
        (providers::AGENT, agent_types()),
        (providers::AUTHORIZATION, authorization_types()),
        (providers::PROMPT, prompt_types()),
        (providers::DATA_SOURCE, data_source_types()),
        (providers::CONFIGURATION, configuration_types()),
        (providers::VECTORIZATION, vectorization_types()),
        (providers::ATTACHMENT, attachment_types()),
        (providers::AI_MODEL, ai_model_types()),
        (providers::AZURE_OPENAI, azure_openai_types()),
    ])
});

static EMPTY: Lazy<ResourceTypeMap> = Lazy::new(BTreeMap::new);

/// Schema of `provider`; an unknown provider yields an empty map so every type is rejected.
pub fn allowed_resource_types(provider: &str) -> &'static ResourceTypeMap {
    REGISTRY.get(provider).unwrap_or_else(|| &*EMPTY)
}

pub fn has_schema(provider: &str) -> bool { REGISTRY.contains_key(provider) }
