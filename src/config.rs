use std::path::PathBuf;

use tracing::{debug, info};

/// Basic-auth credentials for the repository. Never stored in the YAML
/// settings file; injected from the environment by `load_config`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Fully merged runtime settings. Constructed once at startup and passed by
/// reference into every component; no component re-reads configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Repository host, with or without an explicit scheme.
    pub fedora_path: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Datastream id used when an operation does not name one.
    pub default_dsid: String,
    /// Where harvested datastream content lands.
    pub destination_directory: PathBuf,
    /// Page-size cap passed to the search endpoint.
    pub max_results: u32,
    /// Per-identifier purge outcomes are written here.
    pub log_file: PathBuf,
    pub credentials: Credentials,
}

impl Settings {
    fn host(&self) -> String {
        if self.fedora_path.starts_with("http") {
            self.fedora_path.clone()
        } else {
            format!("http://{}", self.fedora_path)
        }
    }

    /// Root of the Fedora REST API, e.g. `http://repo.example.org:8080/fedora`.
    pub fn service_root(&self) -> String {
        format!("{}:{}/fedora", self.host(), self.port)
    }

    /// Root of the gsearch REST service on the same host.
    pub fn gsearch_root(&self) -> String {
        format!("{}:{}/fedoragsearch", self.host(), self.port)
    }

    pub fn trace_loaded(&self) {
        info!(
            service_root = %self.service_root(),
            default_dsid = %self.default_dsid,
            destination = %self.destination_directory.display(),
            max_results = self.max_results,
            "Loaded settings"
        );
        debug!(log_file = %self.log_file.display(), "Settings loaded (full debug)");
    }
}
