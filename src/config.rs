/// Client settings
///
/// Settings are read from a JSON file in the user's config directory:
/// - Linux: ~/.config/map-maker/settings.json
/// - macOS: ~/Library/Application Support/map-maker/settings.json
/// - Windows: %APPDATA%\map-maker\settings.json
///
/// A missing file means defaults. Environment variables override the file.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const ENV_BACKEND_ADDRESS: &str = "MAP_MAKER_BACKEND_ADDRESS";
pub const ENV_BACKEND_COMMAND: &str = "MAP_MAKER_BACKEND_COMMAND";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the REST backend, with trailing slash
    pub backend_address: String,
    /// Backend executable to launch on start-up (None = don't launch)
    pub backend_command: Option<PathBuf>,
    /// Directory the backend writes views and pipeline previews into
    pub output_dir: PathBuf,
    /// How often the pipeline preview directory is scanned
    pub pipeline_poll_ms: u64,
    /// Per-request timeout; generation can take minutes
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_address: String::from("http://127.0.0.1:8000/"),
            backend_command: Some(default_backend_command()),
            output_dir: PathBuf::from("out"),
            pipeline_poll_ms: 300,
            request_timeout_secs: 900,
        }
    }
}

fn default_backend_command() -> PathBuf {
    let mut path = PathBuf::from("../target/release/rest_api");
    if cfg!(windows) {
        path.set_extension("exe");
    }
    path
}

impl Settings {
    /// Load settings from the default location, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::settings_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Get the path where the settings file should live
    fn settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("map-maker");
        path.push("settings.json");
        Some(path)
    }

    /// Read settings from a JSON file. A missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings: Settings = serde_json::from_str(&json)?;
                log::info!("⚙️  Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_BACKEND_ADDRESS) {
            self.backend_address = normalize_address(&address)?;
        }
        if let Some(command) = lookup(ENV_BACKEND_COMMAND) {
            self.backend_command = if command.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(command))
            };
        }
        Ok(())
    }

    /// Directory the backend's generation pipeline dumps previews into
    pub fn pipeline_dir(&self) -> PathBuf {
        self.output_dir.join("pipeline")
    }

    /// Directory a disk-rendered view is written to
    pub fn view_dir(&self, view_name: &str) -> PathBuf {
        self.output_dir.join(view_name)
    }
}

/// Ensure the address is an http(s) URL ending in `/` so endpoint names
/// can be appended directly.
fn normalize_address(address: &str) -> Result<String> {
    let address = address.trim();
    if !(address.starts_with("http://") || address.starts_with("https://")) {
        return Err(Error::Config(format!(
            "backend address must start with http:// or https://, got `{}`",
            address
        )));
    }
    if address.ends_with('/') {
        Ok(address.to_string())
    } else {
        Ok(format!("{}/", address))
    }
}
