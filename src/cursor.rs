//! Drives the paginated search endpoint to completion.

use std::io::Write;

use tracing::{info, warn};

use crate::client::RepositoryClient;
use crate::xml;

/// All identifiers matched by one search query. Grows while [`populate`]
/// walks the pages and is not mutated afterwards, except by the page-free
/// variants that drop child objects before an operation runs.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub results: Vec<String>,
    pub size: usize,
    /// The first-page URL the set was built from.
    pub query: String,
}

impl ResultSet {
    pub fn count(&self) -> usize {
        self.results.len()
    }

    /// Drop every identifier in `children` from the set.
    pub fn remove_all(&mut self, children: &[String]) {
        self.results.retain(|pid| !children.contains(pid));
        self.size = self.results.len();
    }
}

/// Walks every page of `query_url`, accumulating `<pid>` values until the
/// response carries no single continuation `<token>`.
///
/// Exactly one token means another page exists and is fetched with
/// `&sessionToken={token}` appended to the original query; zero tokens — or
/// the anomalous case of more than one — ends pagination. A non-success
/// status, a transport error, or a body without pids and without a token all
/// end pagination too: the identifiers gathered so far are returned as-is,
/// so callers must not assume a non-empty result.
pub async fn populate(client: &dyn RepositoryClient, query_url: &str) -> ResultSet {
    let mut set = ResultSet {
        query: query_url.to_string(),
        ..Default::default()
    };
    let mut token: Option<String> = None;

    print!("Populating result set");
    loop {
        let page_url = match &token {
            Some(token) => format!("{query_url}&sessionToken={token}"),
            None => query_url.to_string(),
        };
        let response = match client.get(&page_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = ?e, url = %page_url, "Search page fetch failed; ending pagination");
                break;
            }
        };
        if !response.is_success() {
            warn!(
                status = response.status,
                url = %page_url,
                "Search page returned non-success; ending pagination"
            );
            break;
        }

        let body = response.text();
        for pid in xml::element_values(&body, "pid") {
            set.results.push(pid);
            set.size += 1;
        }
        print!(".");
        let _ = std::io::stdout().flush();

        let tokens = xml::element_values(&body, "token");
        if tokens.len() == 1 {
            token = Some(tokens[0].clone());
        } else {
            break;
        }
    }
    println!();

    info!(total = set.size, query = %set.query, "Result set populated");
    set
}
