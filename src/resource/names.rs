//! Well-known tokens and names shared by the path grammar, the provider schemas and the
//! action catalog.

pub const INSTANCE_TOKEN: &str = "instances";
pub const RESOURCE_PROVIDER_TOKEN: &str = "providers";

pub mod providers {
    pub const AGENT: &str = "FoundationaLLM.Agent";
    pub const AUTHORIZATION: &str = "FoundationaLLM.Authorization";
    pub const PROMPT: &str = "FoundationaLLM.Prompt";
    pub const DATA_SOURCE: &str = "FoundationaLLM.DataSource";
    pub const CONFIGURATION: &str = "FoundationaLLM.Configuration";
    pub const VECTORIZATION: &str = "FoundationaLLM.Vectorization";
    pub const ATTACHMENT: &str = "FoundationaLLM.Attachment";
    pub const AI_MODEL: &str = "FoundationaLLM.AIModel";
    pub const AZURE_OPENAI: &str = "FoundationaLLM.AzureOpenAI";

    /// Every resource provider name the platform recognizes.
    pub const ALL: &[&str] = &[AGENT, AUTHORIZATION, PROMPT, DATA_SOURCE, CONFIGURATION, VECTORIZATION, ATTACHMENT, AI_MODEL, AZURE_OPENAI];
}

pub mod types {
    pub const AGENTS: &str = "agents";
    pub const AGENT_FILES: &str = "agentFiles";
    pub const ROLE_ASSIGNMENTS: &str = "roleAssignments";
    pub const ROLE_DEFINITIONS: &str = "roleDefinitions";
    pub const PROMPTS: &str = "prompts";
    pub const DATA_SOURCES: &str = "dataSources";
    pub const APP_CONFIGURATIONS: &str = "appConfigurations";
    pub const KEY_VAULT_SECRETS: &str = "keyVaultSecrets";
    pub const API_ENDPOINT_CONFIGURATIONS: &str = "apiEndpointConfigurations";
    pub const VECTORIZATION_PIPELINES: &str = "vectorizationPipelines";
    pub const VECTORIZATION_REQUESTS: &str = "vectorizationRequests";
    pub const CONTENT_SOURCE_PROFILES: &str = "contentSourceProfiles";
    pub const TEXT_PARTITIONING_PROFILES: &str = "textPartitioningProfiles";
    pub const TEXT_EMBEDDING_PROFILES: &str = "textEmbeddingProfiles";
    pub const INDEXING_PROFILES: &str = "indexingProfiles";
    pub const ATTACHMENTS: &str = "attachments";
    pub const AI_MODELS: &str = "aiModels";
    pub const ASSISTANT_USER_CONTEXTS: &str = "assistantUserContexts";
    pub const FILE_USER_CONTEXTS: &str = "fileUserContexts";
}

/// Action tokens that may terminate a resource path.
pub mod actions {
    pub const CHECK_NAME: &str = "checkname";
    pub const PURGE: &str = "purge";
    pub const FILTER: &str = "filter";
    pub const ACTIVATE: &str = "activate";
    pub const DEACTIVATE: &str = "deactivate";
    pub const PROCESS: &str = "process";
}

pub fn is_known_provider(name: &str) -> bool { providers::ALL.contains(&name) }
