//! Datastream version retention: keep the newest version, purge the rest.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::client::{ClientError, RepositoryClient};
use crate::config::Settings;
use crate::confirm::Confirmation;
use crate::xml;

/// What to do with one datastream's version timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionDecision {
    /// Fewer than two versions: nothing to purge.
    KeepOnly,
    /// Purge everything from `start` through `end` inclusive, which retains
    /// only the single newest version.
    PurgeRange { start: String, end: String },
    /// A single, structurally ambiguous history entry: do not delete.
    Unparseable,
}

/// Retention decision over an unordered list of version creation timestamps.
/// `single_profile` marks the ambiguous one-entry history representation,
/// which is conservatively left alone.
///
/// Timestamps are ISO-8601 strings, so lexicographic order is chronological:
/// after a descending sort, index 1 is the second-newest version and the last
/// index is the oldest. The purge window runs from the oldest through the
/// second-newest.
pub fn retention_decision(mut created: Vec<String>, single_profile: bool) -> RetentionDecision {
    if single_profile {
        return RetentionDecision::Unparseable;
    }
    if created.len() < 2 {
        return RetentionDecision::KeepOnly;
    }
    created.sort();
    created.reverse();
    RetentionDecision::PurgeRange {
        start: created[created.len() - 1].clone(),
        end: created[1].clone(),
    }
}

/// Fetches the version history for `(pid, dsid)` and decides the retention
/// window. A non-success response is an error the purge loop logs and skips.
pub async fn history_of(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
    dsid: &str,
) -> Result<RetentionDecision, ClientError> {
    let url = format!(
        "{}/objects/{}/datastreams/{}/history?format=xml",
        settings.service_root(),
        pid,
        dsid
    );
    let response = client.get(&url).await?;
    if !response.is_success() {
        return Err(format!(
            "history fetch for {pid}/{dsid} returned {}",
            response.status
        )
        .into());
    }
    let body = response.text();
    let created = xml::element_values(&body, "dsCreateDate");
    let single_profile = xml::element_count(&body, "datastreamProfile") == 1;
    Ok(retention_decision(created, single_profile))
}

/// Issues the window-scoped DELETE. Destructive and irreversible; callers
/// gate this behind operator confirmation. Returns the log line on success
/// or a diagnostic line embedding the failed request on failure.
pub async fn purge(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
    dsid: &str,
    start: &str,
    end: &str,
) -> String {
    let log_message = format!("Purging {dsid} on {pid} from {start} until {end}");
    let url = format!(
        "{}/objects/{}/datastreams/{}?startDT={}&endDT={}&logMessage={}",
        settings.service_root(),
        pid,
        dsid,
        start,
        end,
        log_message.replace(' ', "%20")
    );
    match client.delete(&url).await {
        Ok(200) => log_message,
        Ok(status) => format!("Failed to purge {dsid} on {pid} with {status}.\n\n{url}"),
        Err(e) => format!("Failed to purge {dsid} on {pid}: {e}.\n\n{url}"),
    }
}

/// Purges all but the newest `dsid` version for every identifier in the set.
///
/// The confirmation gate comes first: declining exits cleanly before any
/// request is issued. One outcome line per identifier goes to the configured
/// log file.
pub async fn purge_all_but_newest(
    client: &dyn RepositoryClient,
    settings: &Settings,
    confirm: &dyn Confirmation,
    pids: &[String],
    dsid: &str,
) -> Result<()> {
    let prompt = format!(
        "Are you sure you want to delete all but the newest {dsid} for each object in the collection?"
    );
    if !confirm.confirm(&prompt) {
        println!("\nExiting...");
        return Ok(());
    }

    let mut log_file = File::create(&settings.log_file)
        .with_context(|| format!("creating log file {:?}", settings.log_file))?;
    let bar = ProgressBar::new(pids.len() as u64);
    for pid in pids {
        match history_of(client, settings, pid, dsid).await {
            Ok(RetentionDecision::PurgeRange { start, end }) => {
                let outcome = purge(client, settings, pid, dsid, &start, &end).await;
                writeln!(log_file, "{outcome}")?;
            }
            Ok(decision) => {
                debug!(pid = %pid, ?decision, "Nothing to purge");
            }
            Err(e) => {
                warn!(pid = %pid, error = ?e, "Version history unavailable");
                writeln!(log_file, "Could not read {dsid} history for {pid}: {e}")?;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(log_file = %settings.log_file.display(), "Version purge complete");
    Ok(())
}
