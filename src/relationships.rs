//! Membership resolution from the repository's relationship endpoint.
//!
//! The endpoint serves one triple per query as turtle text. That
//! serialization is parsed positionally, exactly as the repository emits it;
//! anything that does not decompose as expected is [`TripleParse::Malformed`]
//! and contributes no record — a deliberate, preserved policy, not an error.

use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::client::RepositoryClient;
use crate::config::Settings;
use crate::query::escape_reserved;

pub const RELS_EXT_NAMESPACE: &str = "info:fedora/fedora-system:def/relations-external#";
pub const ISLANDORA_NAMESPACE: &str = "http://islandora.ca/ontology/relsext#";

const PAGE_ORDINAL_RELATIONSHIP: &str = "isPageNumber";

/// One resolved child-to-parent membership, with the page ordinal when the
/// repository records one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRecord {
    pub child: String,
    pub parent: String,
    pub ordinal: Option<String>,
}

/// Outcome of parsing one serialized relationship triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripleParse {
    /// The related object's identifier.
    Parsed(String),
    Malformed,
}

/// A well-formed membership body splits into exactly four segments on `>`;
/// the third carries the bracketed object URI, which becomes an identifier
/// once the `<info:fedora/` prefix and embedded spaces are stripped.
pub fn parse_object_triple(body: &str) -> TripleParse {
    let segments: Vec<&str> = body.split('>').collect();
    if segments.len() != 4 {
        return TripleParse::Malformed;
    }
    let object = segments[2].replace("<info:fedora/", "").replace(' ', "");
    TripleParse::Parsed(object)
}

/// A well-formed ordinal body is exactly four whitespace-separated tokens;
/// the third is the quoted ordinal literal.
pub fn parse_ordinal_triple(body: &str) -> Option<String> {
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() != 4 {
        return None;
    }
    Some(tokens[2].replace('"', ""))
}

fn relationship_url(settings: &Settings, pid: &str, namespace: &str, relationship: &str) -> String {
    let predicate = escape_reserved(&format!("{namespace}{relationship}"));
    format!(
        "{}/objects/{}/relationships?subject=info%3afedora%2f{}&format=turtle&predicate={}",
        settings.service_root(),
        pid,
        pid,
        predicate
    )
}

/// Page ordinal for one identifier, if the repository records one.
pub async fn resolve_ordinal(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
) -> Option<String> {
    let url = relationship_url(settings, pid, ISLANDORA_NAMESPACE, PAGE_ORDINAL_RELATIONSHIP);
    match client.get(&url).await {
        Ok(response) if response.is_success() => parse_ordinal_triple(&response.text()),
        Ok(response) => {
            debug!(pid = %pid, status = response.status, "No ordinal relationship");
            None
        }
        Err(e) => {
            warn!(pid = %pid, error = ?e, "Ordinal lookup failed");
            None
        }
    }
}

/// Membership for a single identifier. Non-success responses and malformed
/// triples yield `None`; the caller moves on to the next identifier.
pub async fn resolve_one(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pid: &str,
    relationship: &str,
) -> Option<MembershipRecord> {
    let url = relationship_url(settings, pid, RELS_EXT_NAMESPACE, relationship);
    let response = match client.get(&url).await {
        Ok(response) => response,
        Err(e) => {
            warn!(pid = %pid, error = ?e, "Relationship fetch failed; skipping");
            return None;
        }
    };
    if !response.is_success() {
        debug!(pid = %pid, status = response.status, "No relationship document");
        return None;
    }
    match parse_object_triple(&response.text()) {
        TripleParse::Parsed(parent) => {
            let ordinal = resolve_ordinal(client, settings, pid).await;
            Some(MembershipRecord {
                child: pid.to_string(),
                parent,
                ordinal,
            })
        }
        TripleParse::Malformed => {
            debug!(pid = %pid, "Relationship body did not decompose into a single triple; skipping");
            None
        }
    }
}

/// Memberships for every identifier in the set, in input order. Identifiers
/// without a parseable relationship contribute nothing; a failure never ends
/// the batch.
pub async fn resolve(
    client: &dyn RepositoryClient,
    settings: &Settings,
    pids: &[String],
    relationship: &str,
) -> Vec<MembershipRecord> {
    println!("Finding {relationship} objects for items in result list.");
    let bar = ProgressBar::new(pids.len() as u64);
    let mut memberships = Vec::new();
    for pid in pids {
        if let Some(record) = resolve_one(client, settings, pid, relationship).await {
            memberships.push(record);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    memberships
}
