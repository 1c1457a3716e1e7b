//! Catalog of authorizable actions and wildcard expansion over it.
//!
//! The catalog is a compile-time table; `get_matching_actions` turns a role definition
//! pattern such as `FoundationaLLM.Agent/*` or `*/read` into the concrete names it covers.
//! A `*` only spans letters, `/` and `.`, never digits or other punctuation.

use regex::Regex;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthorizableAction {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

const fn action(name: &'static str, description: &'static str, category: &'static str) -> AuthorizableAction {
    AuthorizableAction { name, description, category }
}

pub const ROLE_ASSIGNMENTS_READ: &str = "FoundationaLLM.Authorization/roleAssignments/read";
pub const ROLE_ASSIGNMENTS_WRITE: &str = "FoundationaLLM.Authorization/roleAssignments/write";
pub const ROLE_ASSIGNMENTS_DELETE: &str = "FoundationaLLM.Authorization/roleAssignments/delete";
pub const ROLE_DEFINITIONS_READ: &str = "FoundationaLLM.Authorization/roleDefinitions/read";

pub const CATALOG: &[AuthorizableAction] = &[
    action(ROLE_ASSIGNMENTS_READ, "Read role assignments.", "Authorization"),
    action(ROLE_ASSIGNMENTS_WRITE, "Create or update role assignments.", "Authorization"),
    action(ROLE_ASSIGNMENTS_DELETE, "Delete role assignments.", "Authorization"),
    action(ROLE_DEFINITIONS_READ, "Read role definitions.", "Authorization"),
    action("FoundationaLLM.Agent/agents/read", "Read agents.", "Agent"),
    action("FoundationaLLM.Agent/agents/write", "Create or update agents.", "Agent"),
    action("FoundationaLLM.Agent/agents/delete", "Delete agents.", "Agent"),
    action("FoundationaLLM.AzureOpenAI/assistantUserContexts/read", "Read assistant user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.AzureOpenAI/assistantUserContexts/write", "Create or update assistant user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.AzureOpenAI/assistantUserContexts/delete", "Delete assistant user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.AzureOpenAI/fileUserContexts/read", "Read file user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.AzureOpenAI/fileUserContexts/write", "Create or update file user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.AzureOpenAI/fileUserContexts/delete", "Delete file user contexts.", "AzureOpenAI"),
    action("FoundationaLLM.Configuration/appConfigurations/read", "Read app configurations.", "Configuration"),
    action("FoundationaLLM.Configuration/appConfigurations/write", "Create or update app configurations.", "Configuration"),
    action("FoundationaLLM.Configuration/appConfigurations/delete", "Delete app configurations.", "Configuration"),
    action("FoundationaLLM.Configuration/keyVaultSecrets/read", "Read key vault secrets.", "Configuration"),
    action("FoundationaLLM.Configuration/keyVaultSecrets/write", "Create or update key vault secrets.", "Configuration"),
    action("FoundationaLLM.Configuration/keyVaultSecrets/delete", "Delete key vault secrets.", "Configuration"),
    action("FoundationaLLM.Configuration/apiEndpointConfigurations/read", "Read API endpoint configurations.", "Configuration"),
    action("FoundationaLLM.Configuration/apiEndpointConfigurations/write", "Create or update API endpoint configurations.", "Configuration"),
    action("FoundationaLLM.Configuration/apiEndpointConfigurations/delete", "Delete API endpoint configurations.", "Configuration"),
    action("FoundationaLLM.DataSource/dataSources/read", "Read data sources.", "DataSource"),
    action("FoundationaLLM.DataSource/dataSources/write", "Create or update data sources.", "DataSource"),
    action("FoundationaLLM.DataSource/dataSources/delete", "Delete data sources.", "DataSource"),
    action("FoundationaLLM.Prompt/prompts/read", "Read prompts.", "Prompt"),
    action("FoundationaLLM.Prompt/prompts/write", "Create or update prompts.", "Prompt"),
    action("FoundationaLLM.Prompt/prompts/delete", "Delete prompts.", "Prompt"),
    action("FoundationaLLM.Vectorization/vectorizationPipelines/read", "Read vectorization pipelines.", "Vectorization"),
    action("FoundationaLLM.Vectorization/vectorizationPipelines/write", "Create or update vectorization pipelines.", "Vectorization"),
    action("FoundationaLLM.Vectorization/vectorizationPipelines/delete", "Delete vectorization pipelines.", "Vectorization"),
    action("FoundationaLLM.Vectorization/vectorizationRequests/read", "Read vectorization requests.", "Vectorization"),
    action("FoundationaLLM.Vectorization/vectorizationRequests/write", "Create or update vectorization requests.", "Vectorization"),
    action("FoundationaLLM.Vectorization/vectorizationRequests/delete", "Delete vectorization requests.", "Vectorization"),
    action("FoundationaLLM.Vectorization/contentSourceProfiles/read", "Read vectorization content source profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/contentSourceProfiles/write", "Create or update vectorization content source profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/contentSourceProfiles/delete", "Delete vectorization content source profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textPartitioningProfiles/read", "Read vectorization text partitioning profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textPartitioningProfiles/write", "Create or update vectorization text partitioning profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textPartitioningProfiles/delete", "Delete vectorization text partitioning profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textEmbeddingProfiles/read", "Read vectorization text embedding profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textEmbeddingProfiles/write", "Create or update vectorization text embedding profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/textEmbeddingProfiles/delete", "Delete vectorization text embedding profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/indexingProfiles/read", "Read vectorization indexing profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/indexingProfiles/write", "Create or update vectorization indexing profiles.", "Vectorization"),
    action("FoundationaLLM.Vectorization/indexingProfiles/delete", "Delete vectorization indexing profiles.", "Vectorization"),
    action("FoundationaLLM.Completion/chatSessions/read", "Read chat sessions.", "Completion"),
    action("FoundationaLLM.Completion/chatSessions/write", "Create or update chat sessions.", "Completion"),
    action("FoundationaLLM.Completion/chatSessions/delete", "Delete chat sessions.", "Completion"),
    action("FoundationaLLM.Completion/directCompletions/read", "Read direct completions.", "Completion"),
    action("FoundationaLLM.Completion/directCompletions/write", "Create or update direct completions.", "Completion"),
    action("FoundationaLLM.Completion/directCompletions/delete", "Delete direct completions.", "Completion"),
    action("FoundationaLLM.Attachment/attachments/read", "Read attachments.", "Attachment"),
    action("FoundationaLLM.Attachment/attachments/write", "Create or update attachments.", "Attachment"),
    action("FoundationaLLM.Attachment/attachments/delete", "Delete attachments.", "Attachment"),
    action("FoundationaLLM.AIModel/aiModels/read", "Read AI models", "AIModel"),
    action("FoundationaLLM.AIModel/aiModels/write", "Create or update AI models.", "AIModel"),
    action("FoundationaLLM.AIModel/aiModels/delete", "Delete AI models.", "AIModel"),
];

fn pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    // Only `.` needs escaping; `/` is not a regex metacharacter.
    let body = pattern.replace('.', "\\.").replace('*', "[a-zA-Z/.]*");
    Regex::new(&format!("^{}$", body))
}

/// Catalog names matched by `pattern`, in catalog order.
/// A pattern that does not compile matches nothing.
pub fn get_matching_actions(pattern: &str) -> Vec<&'static str> {
    match pattern_to_regex(pattern) {
        Ok(rx) => CATALOG.iter().filter(|a| rx.is_match(a.name)).map(|a| a.name).collect(),
        Err(e) => {
            warn!(target: "fllm::authz", "action pattern [{}] is not usable: {}", pattern, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod actions_tests;
