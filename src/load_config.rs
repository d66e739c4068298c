use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{Credentials, Settings};

/// The static, non-sensitive half of the configuration, as stored on disk.
#[derive(Deserialize)]
struct StaticSettings {
    fedora_path: String,
    port: u16,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    default_dsid: String,
    destination_directory: PathBuf,
    max_results: u32,
    log_file: PathBuf,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Loads the static YAML settings file (no secrets) and injects the
/// credentials from the environment. Returns fully merged [`Settings`] or a
/// startup error; nothing is loaded lazily after this point.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticSettings = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let username = match std::env::var("FEDORA_USERNAME") {
        Ok(var) => var,
        Err(e) => {
            error!(error = ?e, "FEDORA_USERNAME environment variable not set");
            return Err(anyhow::anyhow!(
                "FEDORA_USERNAME environment variable not set: {e}"
            ));
        }
    };

    let password = match std::env::var("FEDORA_PASSWORD") {
        Ok(var) => var,
        Err(e) => {
            error!(error = ?e, "FEDORA_PASSWORD environment variable not set");
            return Err(anyhow::anyhow!(
                "FEDORA_PASSWORD environment variable not set: {e}"
            ));
        }
    };

    let settings = Settings {
        fedora_path: static_conf.fedora_path,
        port: static_conf.port,
        request_timeout_secs: static_conf.request_timeout_secs,
        default_dsid: static_conf.default_dsid,
        destination_directory: static_conf.destination_directory,
        max_results: static_conf.max_results,
        log_file: static_conf.log_file,
        credentials: Credentials { username, password },
    };

    settings.trace_loaded();
    Ok(settings)
}
