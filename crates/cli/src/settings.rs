// Layered configuration: defaults < gpoctl.toml < --config < GPOCTL_* env

use anyhow::{Context, Result};
use directories::ProjectDirs;
use gpoctl_infra_system::{DEFAULT_KEYRING_SERVICE, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "gpoctl.toml";
const ENV_PREFIX: &str = "GPOCTL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Domain used when `--domain` is not given
    pub default_domain: Option<String>,
    pub powershell_path: String,
    pub query_timeout_secs: u64,
    pub log_format: LogFormat,
    /// Enables a daily rolling log file in this directory
    pub log_dir: Option<PathBuf>,
    /// Keyring service name credentials are stored under
    pub keyring_service: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_domain: None,
            powershell_path: default_powershell().to_string(),
            query_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_format: LogFormat::default(),
            log_dir: None,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
        }
    }
}

fn default_powershell() -> &'static str {
    if cfg!(windows) {
        "powershell.exe"
    } else {
        "pwsh"
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gpoctl")
}

impl Settings {
    /// Load settings from every layer; `explicit` must exist when given
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_file = project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE));
        Self::load_from(user_file.as_deref(), explicit)
    }

    fn load_from(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = user_file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.query_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_files() {
        let settings = Settings::default();
        assert_eq!(settings.query_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert!(settings.default_domain.is_none());
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();

        let user = dir.path().join("user.toml");
        let mut f = std::fs::File::create(&user).unwrap();
        writeln!(f, "default_domain = \"corp.local\"\nquery_timeout_secs = 30").unwrap();

        let explicit = dir.path().join("explicit.toml");
        let mut f = std::fs::File::create(&explicit).unwrap();
        writeln!(f, "query_timeout_secs = 45\nlog_format = \"json\"").unwrap();

        let settings = Settings::load_from(Some(&user), Some(&explicit)).unwrap();
        assert_eq!(settings.default_domain.as_deref(), Some("corp.local"));
        assert_eq!(settings.query_timeout_secs, 45);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load_from(None, Some(&missing)).is_err());
    }

    #[test]
    fn test_keyring_service_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        let mut f = std::fs::File::create(&explicit).unwrap();
        writeln!(f, "keyring_service = \"gpoctl-lab\"").unwrap();

        assert_eq!(Settings::default().keyring_service, DEFAULT_KEYRING_SERVICE);
        let settings = Settings::load_from(None, Some(&explicit)).unwrap();
        assert_eq!(settings.keyring_service, "gpoctl-lab");
    }
}
