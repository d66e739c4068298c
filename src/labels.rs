//! Label propagation: compose a page's label from its parent's descriptive
//! metadata and the page ordinal.

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::client::RepositoryClient;
use crate::config::Settings;
use crate::relationships;
use crate::xml;

/// Datastream that carries the descriptive record labels are read from.
const DESCRIPTIVE_DSID: &str = "MODS";

/// First text value of `element` in the object's descriptive metadata,
/// typically a title element.
async fn descriptive_value(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
    element: &str,
) -> Option<String> {
    let url = format!(
        "{}/objects/{}/datastreams/{}/content",
        settings.service_root(),
        pid,
        DESCRIPTIVE_DSID
    );
    match client.get(&url).await {
        Ok(response) if response.is_success() => {
            xml::element_values(&response.text(), element).into_iter().next()
        }
        Ok(response) => {
            warn!(pid = %pid, status = response.status, "No descriptive metadata");
            None
        }
        Err(e) => {
            warn!(pid = %pid, error = ?e, "Descriptive metadata fetch failed");
            None
        }
    }
}

async fn put_label(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
    label: &str,
) -> bool {
    let url = format!(
        "{}/objects/{}?label={}",
        settings.service_root(),
        pid,
        label.replace(' ', "%20")
    );
    match client.put(&url).await {
        Ok(200) => {
            println!("\tSuccessfully updated {pid} to {label}.");
            true
        }
        Ok(status) => {
            println!("Failed to update {pid} with {status}.");
            false
        }
        Err(e) => {
            warn!(pid = %pid, error = ?e, "Label update request failed");
            false
        }
    }
}

/// Rewrites every object's label. Pages get
/// `{parent label}:  page {ordinal}`; objects without a parent membership
/// take the label straight from their own descriptive metadata. Failures are
/// logged per identifier and the loop continues.
pub async fn update_labels(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pids: &[String],
    relationship: &str,
    label_element: &str,
) -> Result<usize> {
    let bar = ProgressBar::new(pids.len() as u64);
    let mut updated = 0;
    for pid in pids {
        let label = match relationships::resolve_one(client, settings, pid, relationship).await {
            Some(record) => {
                println!("Finding parent of page {pid}.");
                let parent_label =
                    descriptive_value(client, settings, &record.parent, label_element).await;
                match (parent_label, record.ordinal) {
                    (Some(parent_label), Some(ordinal)) => {
                        Some(format!("{parent_label}:  page {ordinal}"))
                    }
                    (Some(parent_label), None) => Some(parent_label),
                    _ => None,
                }
            }
            None => descriptive_value(client, settings, pid, label_element).await,
        };
        match label {
            Some(label) => {
                if put_label(client, settings, pid, &label).await {
                    updated += 1;
                }
            }
            None => {
                warn!(pid = %pid, element = %label_element, "No label value found; skipping");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(updated, total = pids.len(), "Label update complete");
    Ok(updated)
}
