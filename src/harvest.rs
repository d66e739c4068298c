//! Bulk datastream download into the destination directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::client::{HttpResponse, RepositoryClient};
use crate::config::Settings;

/// Counts plus per-identifier failure tuples for the final summary. A status
/// of 0 marks a transport-level failure (timeout, refused connection).
#[derive(Debug, Default)]
pub struct HarvestReport {
    pub downloaded: usize,
    pub failures: Vec<(String, u16)>,
}

/// File extension taken from the response content type,
/// e.g. `text/xml; charset=utf-8` becomes `xml`.
fn extension_from(response: &HttpResponse) -> String {
    response
        .content_type
        .as_deref()
        .and_then(|content_type| content_type.split(';').next())
        .and_then(|mime| mime.split('/').nth(1))
        .unwrap_or("bin")
        .to_string()
}

/// Downloads the `dsid` content stream for every identifier into the
/// destination directory, one file per object, named `{pid}.{ext}` with the
/// pid's `:` flattened to `_`. Failures are recorded and the loop continues.
pub async fn harvest_metadata(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pids: &[String],
    dsid: Option<&str>,
) -> Result<HarvestReport> {
    let dsid = dsid.unwrap_or(&settings.default_dsid);
    fs::create_dir_all(&settings.destination_directory).with_context(|| {
        format!(
            "creating destination directory {:?}",
            settings.destination_directory
        )
    })?;

    let bar = ProgressBar::new(pids.len() as u64);
    let mut report = HarvestReport::default();
    for pid in pids {
        let url = format!(
            "{}/objects/{}/datastreams/{}/content",
            settings.service_root(),
            pid,
            dsid
        );
        match client.get(&url).await {
            Ok(response) if response.is_success() => {
                let name = format!("{}.{}", pid.replace(':', "_"), extension_from(&response));
                let path = settings.destination_directory.join(name);
                fs::write(&path, &response.body)
                    .with_context(|| format!("writing {path:?}"))?;
                report.downloaded += 1;
            }
            Ok(response) => {
                warn!(pid = %pid, status = response.status, "Could not harvest datastream");
                report.failures.push((pid.clone(), response.status));
            }
            Err(e) => {
                warn!(pid = %pid, error = ?e, "Harvest request failed");
                report.failures.push((pid.clone(), 0));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        downloaded = report.downloaded,
        failed = report.failures.len(),
        dsid = %dsid,
        "Harvest complete"
    );
    Ok(report)
}

/// All matched identifiers, one per line.
pub fn write_results(path: &Path, pids: &[String]) -> Result<()> {
    let mut file = fs::File::create(path).with_context(|| format!("creating {path:?}"))?;
    for pid in pids {
        writeln!(file, "{pid}")?;
    }
    Ok(())
}
