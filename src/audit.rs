//! "Bad books": flag compound objects whose parts are missing a datastream.
//!
//! A book with one defective page is unusable as a whole, and once a book is
//! flagged every one of its pages is flagged too — even pages whose own
//! datastream is intact. That escalation is domain policy and is preserved
//! exactly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::client::RepositoryClient;
use crate::config::Settings;
use crate::cursor::ResultSet;
use crate::relationships::{self, MembershipRecord};

/// Deduplicated audit outcome, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditResult {
    /// Defective parents plus every page escalated from them.
    pub items_to_remove: Vec<String>,
    /// Defective parents only.
    pub book_objects_to_remove: Vec<String>,
}

/// Identifiers whose `dsid` datastream probe does not succeed. A transport
/// error counts as missing, exactly like a non-2xx status.
pub async fn mark_as_missing(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pids: &[String],
    dsid: &str,
) -> Vec<String> {
    println!("Finding results that are missing a {dsid} datastream.");
    let bar = ProgressBar::new(pids.len() as u64);
    let mut missing = Vec::new();
    for pid in pids {
        let url = format!(
            "{}/objects/{}/datastreams/{}",
            settings.service_root(),
            pid,
            dsid
        );
        match client.get(&url).await {
            Ok(response) if response.is_success() => {}
            Ok(response) => {
                debug!(pid = %pid, status = response.status, "Datastream probe failed");
                missing.push(pid.clone());
            }
            Err(e) => {
                warn!(pid = %pid, error = ?e, "Datastream probe request failed");
                missing.push(pid.clone());
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!(
        "{} of {} were missing a {dsid} datastream.",
        missing.len(),
        pids.len()
    );
    missing
}

/// Two-pass set construction with dedup.
///
/// Pass 1 looks up the parent of every missing identifier and records each
/// parent once, in both output lists. Pass 2 runs only after pass 1 has seen
/// every missing identifier: each membership whose parent is already flagged
/// contributes its child, guarded against duplicate insertion.
pub fn escalate(missing: &[String], memberships: &[MembershipRecord]) -> AuditResult {
    let mut result = AuditResult::default();
    for pid in missing {
        let parent = memberships
            .iter()
            .find(|record| &record.child == pid)
            .map(|record| record.parent.clone());
        if let Some(parent) = parent {
            if !result.items_to_remove.contains(&parent) {
                result.items_to_remove.push(parent.clone());
                result.book_objects_to_remove.push(parent);
            }
        }
    }
    for record in memberships {
        if result.items_to_remove.contains(&record.parent)
            && !result.items_to_remove.contains(&record.child)
        {
            result.items_to_remove.push(record.child.clone());
        }
    }
    result
}

/// Full audit for one result set: probe every identifier for the datastream,
/// resolve every membership, escalate, and persist the flagged list to
/// `trail` (one identifier per line) for downstream deletion tooling.
pub async fn audit_missing(
    client: &dyn RepositoryClient,
    settings: &Settings,
    set: &ResultSet,
    dsid: &str,
    relationship: &str,
    trail: &Path,
) -> Result<AuditResult> {
    let missing = mark_as_missing(client, settings, &set.results, dsid).await;
    let memberships = relationships::resolve(client, settings, &set.results, relationship).await;
    let result = escalate(&missing, &memberships);
    write_pid_list(trail, &result.items_to_remove)?;
    info!(
        flagged = result.items_to_remove.len(),
        books = result.book_objects_to_remove.len(),
        trail = %trail.display(),
        "Audit complete"
    );
    Ok(result)
}

/// One identifier per line: the audit trail downstream deletion reads.
pub fn write_pid_list(path: &Path, pids: &[String]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {path:?}"))?;
    for pid in pids {
        writeln!(file, "{pid}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(child: &str, parent: &str) -> MembershipRecord {
        MembershipRecord {
            child: child.to_string(),
            parent: parent.to_string(),
            ordinal: None,
        }
    }

    fn pids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn one_missing_page_flags_the_book_and_every_sibling() {
        let memberships = vec![
            membership("test:a", "test:p"),
            membership("test:b", "test:p"),
            membership("test:c", "test:p"),
        ];
        let result = escalate(&pids(&["test:a"]), &memberships);
        assert_eq!(result.book_objects_to_remove, pids(&["test:p"]));
        assert_eq!(
            result.items_to_remove,
            pids(&["test:p", "test:a", "test:b", "test:c"])
        );
    }

    #[test]
    fn two_missing_pages_of_one_book_flag_the_book_once() {
        let memberships = vec![
            membership("test:a", "test:p"),
            membership("test:b", "test:p"),
        ];
        let result = escalate(&pids(&["test:a", "test:b"]), &memberships);
        assert_eq!(result.book_objects_to_remove, pids(&["test:p"]));
        assert_eq!(result.items_to_remove, pids(&["test:p", "test:a", "test:b"]));
    }

    #[test]
    fn a_missing_identifier_without_a_parent_is_not_escalated() {
        let memberships = vec![membership("test:a", "test:p")];
        let result = escalate(&pids(&["test:orphan"]), &memberships);
        assert!(result.items_to_remove.is_empty());
        assert!(result.book_objects_to_remove.is_empty());
    }

    #[test]
    fn untouched_books_stay_untouched() {
        let memberships = vec![
            membership("test:a", "test:p"),
            membership("test:x", "test:q"),
        ];
        let result = escalate(&pids(&["test:a"]), &memberships);
        assert!(!result.items_to_remove.contains(&"test:x".to_string()));
        assert!(!result.items_to_remove.contains(&"test:q".to_string()));
    }

    #[test]
    fn escalation_is_idempotent_over_static_inputs() {
        let memberships = vec![
            membership("test:a", "test:p"),
            membership("test:b", "test:p"),
            membership("test:x", "test:q"),
        ];
        let missing = pids(&["test:a", "test:x"]);
        let first = escalate(&missing, &memberships);
        let second = escalate(&missing, &memberships);
        assert_eq!(first, second);
    }
}
