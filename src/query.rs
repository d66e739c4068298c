//! Search query construction for the paginated findObjects endpoint.

use tracing::warn;

use crate::config::Settings;

/// Percent-escapes the characters the repository requires escaped inside
/// predicate and filter strings.
pub fn escape_reserved(value: &str) -> String {
    value
        .replace(':', "%3a")
        .replace('/', "%2f")
        .replace('#', "%23")
}

/// Builder for one collection-scoped search query.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    namespace: Option<String>,
    dc_filter: Option<(String, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to identifiers under this parent namespace
    /// (prefix match on the pid).
    pub fn parent_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Filter on a descriptive metadata field. Both halves are required; a
    /// half-specified filter is a usage error reported to the operator and
    /// then omitted — the query still runs.
    pub fn descriptive_filter(mut self, field: Option<String>, value: Option<String>) -> Self {
        match (field, value) {
            (Some(field), Some(value)) => self.dc_filter = Some((field, value)),
            (None, None) => {}
            _ => {
                warn!("Descriptive filter needs both a field and a value; ignoring it");
                println!("Must include both a dc field and a dc value.");
            }
        }
        self
    }

    /// The fully formed first-page URL. Continuation pages append a session
    /// token to this same URL.
    pub fn url(&self, settings: &Settings) -> String {
        let mut terms = String::new();
        if let Some(namespace) = &self.namespace {
            terms.push_str(&format!("pid%7E{namespace}*"));
        }
        if let Some((field, value)) = &self.dc_filter {
            terms.push_str(&format!("{field}%7E%27{value}%27"));
        }
        format!(
            "{}/objects?query={}&pid=true&resultFormat=xml&maxResults={}",
            settings.service_root(),
            terms,
            settings.max_results
        )
        .replace(' ', "%20")
    }
}
