use outlay_import::MAX_UPLOAD_BYTES;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "OUTLAY_CONFIG";
pub const BIND_ENV: &str = "OUTLAY_BIND";
pub const DATABASE_ENV: &str = "OUTLAY_DATABASE";
pub const DEFAULT_CONFIG_FILE: &str = "outlay.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// SQLite database file.
    pub database: PathBuf,
    /// Origins allowed to make cross-origin requests. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, which bounds CSV uploads.
    pub max_upload_bytes: usize,
    /// Insert the default keyword rules into an empty rule table at startup.
    pub seed_rules: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            database: PathBuf::from("expenses.db"),
            allowed_origins: vec![],
            max_upload_bytes: MAX_UPLOAD_BYTES,
            seed_rules: true,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `OUTLAY_CONFIG` (or `outlay.toml` when present), then applies
    /// `OUTLAY_BIND` and `OUTLAY_DATABASE` on top.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var(CONFIG_ENV).ok();
        let mut config = match explicit.as_deref() {
            Some(path) => Self::from_file(Path::new(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(BIND_ENV).ok(),
            std::env::var(DATABASE_ENV).ok(),
        );
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
    }

    pub fn apply_overrides(&mut self, bind: Option<String>, database: Option<String>) {
        if let Some(bind) = bind.filter(|b| !b.is_empty()) {
            self.bind = bind;
        }
        if let Some(database) = database.filter(|d| !d.is_empty()) {
            self.database = PathBuf::from(database);
        }
    }
}
