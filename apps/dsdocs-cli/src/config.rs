//! User settings: server address and the persisted selection.
//!
//! Stored as JSON in the user config directory (`dsdocs/config.json`)
//! unless `--config` points elsewhere. Keys written by older setups
//! (`serverIP`, `PORT`) are still accepted.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use dsdocs_selection::SelectionFilter;
use dsdocs_upload::{DEFAULT_PORT, EndpointStore, RemoteEndpoint};
use serde::{Deserialize, Serialize};

/// On-disk settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default, alias = "serverIP", skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,

    #[serde(default, alias = "PORT", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    pub filter: SelectionFilter,
}

impl ExtensionConfig {
    /// Loads settings from `path`. A missing file yields defaults; an
    /// unreadable one is logged and replaced by defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse settings, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        write_private(path, &json)?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Settings shared by the commands of one invocation, written through on
/// every change.
pub struct ConfigStore {
    path: PathBuf,
    config: Mutex<ExtensionConfig>,
}

impl ConfigStore {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let config = ExtensionConfig::load(&path)?;
        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter(&self) -> SelectionFilter {
        self.lock().filter.clone()
    }

    pub fn save_filter(&self, filter: &SelectionFilter) -> anyhow::Result<()> {
        let mut config = self.lock();
        config.filter = filter.clone();
        config.save(&self.path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ExtensionConfig> {
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EndpointStore for ConfigStore {
    fn server_ip(&self) -> Option<String> {
        self.lock().server_ip.clone().filter(|ip| !ip.is_empty())
    }

    fn port(&self) -> u16 {
        self.lock().port()
    }

    fn save(&self, endpoint: &RemoteEndpoint) -> std::io::Result<()> {
        let mut config = self.lock();
        config.server_ip = Some(endpoint.to_string());
        config.save(&self.path).map_err(std::io::Error::other)
    }
}

/// Default settings location: `<user config dir>/dsdocs/config.json`.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir()
        .context("could not determine the user config directory, pass --config")?;
    Ok(base.join("dsdocs").join("config.json"))
}

/// Writes `contents` readable by the owner only on unix, including when
/// the file already existed with wider permissions.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}
