//! Whole-object purge driven by a pid-list file (the audit trail).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::client::RepositoryClient;
use crate::config::Settings;
use crate::confirm::Confirmation;

/// Purges one object outright. Returns whether the repository accepted it.
pub async fn purge_object(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
) -> bool {
    let log_message = format!("Purging {pid}.");
    let url = format!(
        "{}/objects/{}?logMessage={}",
        settings.service_root(),
        pid,
        log_message.replace(' ', "%20")
    );
    match client.delete(&url).await {
        Ok(200) => {
            println!("{log_message}");
            true
        }
        Ok(status) => {
            println!("Could not purge {pid}. Status code: {status}.");
            false
        }
        Err(e) => {
            warn!(pid = %pid, error = ?e, "Purge request failed");
            println!("Could not purge {pid}.");
            false
        }
    }
}

/// Reads the pid list and purges every object named in it, behind an
/// explicit operator confirmation. Declining exits cleanly before any
/// request is issued.
pub async fn purge_listed_objects(
    client: &dyn RepositoryClient,
    settings: &Settings,
    confirm: &dyn Confirmation,
    list: &Path,
) -> Result<usize> {
    let contents =
        fs::read_to_string(list).with_context(|| format!("reading pid list {list:?}"))?;
    let pids: Vec<&str> = contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    let prompt = format!("Purge {} objects listed in {}?", pids.len(), list.display());
    if !confirm.confirm(&prompt) {
        println!("\nExiting...");
        return Ok(0);
    }

    let mut purged = 0;
    for pid in pids {
        if purge_object(client, settings, pid).await {
            purged += 1;
        }
    }
    info!(purged, list = %list.display(), "Object purge complete");
    Ok(purged)
}
