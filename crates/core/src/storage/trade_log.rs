use crate::domain::snapshot::Snapshot;
use anyhow::{Context, Result};
use std::path::Path;

/// Rewrites the whole log as one JSON array. O(n) per append; fine for this
/// scope, but worth revisiting if the log is ever expected to outgrow memory.
pub async fn persist(path: &Path, log: &[Snapshot]) -> Result<()> {
    let body = serde_json::to_vec_pretty(log).context("failed to serialize trade log")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("failed to write trade log to {}", path.display()))?;
    Ok(())
}
