use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use fllm_authz::authz::{ActionAuthorizationRequest, ActionAuthorizationResult, AuthorizationCore};
use fllm_authz::config::Settings;
use fllm_authz::storage::FileSystemStorage;

/// Decides authorization requests read from stdin, one JSON document per line, for the
/// instance given as first argument, and prints one result document per line.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let settings = Settings::from_env()?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "fllm",
        "fllm-authz starting: RUST_LOG='{}', storage_root='{}', instances={:?}",
        rust_log, settings.storage_root, settings.authorization.instance_ids
    );

    let instance_id = std::env::args().nth(1).context("usage: fllm-authz <instance-id> < requests.jsonl")?;

    let cancel = CancellationToken::new();
    let storage = Arc::new(FileSystemStorage::new(&settings.storage_root));
    let core = AuthorizationCore::new(settings.authorization.clone(), storage, cancel.clone());
    core.initialize().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = decide_line(&core, &instance_id, &line);
        println!("{}", serde_json::to_string(&result)?);
    }
    cancel.cancel();
    Ok(())
}

/// A line that is not a request document is denied like any other bad request.
fn decide_line(core: &AuthorizationCore, instance_id: &str, line: &str) -> ActionAuthorizationResult {
    match serde_json::from_str::<ActionAuthorizationRequest>(line) {
        Ok(request) => core.process_authorization_request(instance_id, &request),
        Err(e) => {
            warn!(target: "fllm", "skipping malformed authorization request: {}", e);
            ActionAuthorizationResult::denied()
        }
    }
}
