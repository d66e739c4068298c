//! Push result-set identifiers back through the gsearch indexer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::client::RepositoryClient;
use crate::config::Settings;

/// The gsearch REST response is an HTML status page; this row marks a
/// successful single-document update.
const UPDATED_MARKER: &str = "Updated number of index documents: 1";

#[derive(Debug, Default)]
pub struct ReindexReport {
    pub updated: usize,
    pub failures: Vec<(String, u16)>,
}

/// POSTs every identifier to the gsearch update endpoint, writing one
/// outcome line per identifier to `log_path`. A 2xx response only counts as
/// a success when its body carries the update marker.
pub async fn update_gsearch(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pids: &[String],
    log_path: &Path,
) -> Result<ReindexReport> {
    println!("\nUpdating gsearch.");
    let mut log_file =
        File::create(log_path).with_context(|| format!("creating {log_path:?}"))?;
    let bar = ProgressBar::new(pids.len() as u64);
    let mut report = ReindexReport::default();
    for pid in pids {
        let url = format!(
            "{}/rest?operation=updateIndex&action=fromPid&value={}",
            settings.gsearch_root(),
            pid
        );
        match client.post(&url).await {
            Ok(response) if response.is_success() => {
                if response.text().contains(UPDATED_MARKER) {
                    report.updated += 1;
                    writeln!(log_file, "Successfully updated Solr document for {pid}.")?;
                } else {
                    writeln!(log_file, "Failed to update Solr document for {pid}.")?;
                    report.failures.push((pid.clone(), response.status));
                }
            }
            Ok(response) => {
                writeln!(
                    log_file,
                    "Failed to update Solr document for {pid} with {}.",
                    response.status
                )?;
                report.failures.push((pid.clone(), response.status));
            }
            Err(e) => {
                warn!(pid = %pid, error = ?e, "gsearch request failed");
                writeln!(log_file, "Failed to update Solr document for {pid}.")?;
                report.failures.push((pid.clone(), 0));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!("\nSuccessfully updated {} records.", report.updated);
    info!(
        updated = report.updated,
        failed = report.failures.len(),
        "Reindex complete"
    );
    Ok(report)
}
