use folio_upload::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory the local uploader copies files into
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Queue limits and file constraints
    #[serde(default)]
    pub upload: QueueConfig,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_upload_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.upload_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            upload: QueueConfig::default(),
        }
    }
}
