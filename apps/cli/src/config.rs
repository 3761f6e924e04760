//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/pikup/config.toml`
//! - Windows: `%APPDATA%/pikup/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use pikup_upload::UploadOptions;
use serde::{Deserialize, Serialize};

const MIB: usize = 1024 * 1024;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Drive metadata API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token for the drive API. `PIKUP_ACCESS_TOKEN` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Device id sent as `X-Device-Id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Multipart part size in MiB.
    #[serde(default = "default_part_size_mib")]
    pub part_size_mib: usize,

    /// Timeout applied to every network call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Abort multipart uploads that fail part-way.
    #[serde(default = "default_true")]
    pub abort_incomplete_uploads: bool,
}

fn default_api_base_url() -> String {
    pikup_drive::DEFAULT_BASE_URL.into()
}

fn default_part_size_mib() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: None,
            device_id: None,
            part_size_mib: default_part_size_mib(),
            request_timeout_secs: default_request_timeout_secs(),
            abort_incomplete_uploads: true,
        }
    }
}

impl CliConfig {
    /// Loads configuration from `path`, or the platform default location.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&config_path()?),
        }
    }

    /// Loads configuration from disk, or creates a default if not found.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = CliConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (may contain the access token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// The access token to use: `env_override` if non-empty, else the file's.
    pub fn access_token(&self, env_override: Option<String>) -> Option<String> {
        env_override
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone().filter(|t| !t.trim().is_empty()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn upload_options(&self) -> UploadOptions {
        let defaults = UploadOptions::default();
        UploadOptions {
            part_size: if self.part_size_mib == 0 {
                defaults.part_size
            } else {
                self.part_size_mib.saturating_mul(MIB)
            },
            abort_on_failure: self.abort_incomplete_uploads,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("pikup")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("pikup").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/pikup/config.toml"))
    }
}
