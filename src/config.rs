use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite database path; `~` expands. Defaults to
    /// `<workspace>/campuslink.db`.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body cap in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Per-request timeout to shed slow clients
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Browser origins allowed to call the gateway; empty disables CORS
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8787
}

fn default_max_body_bytes() -> usize {
    65_536
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Per-category result cap when the caller does not pass one
    #[serde(default = "default_search_limit")]
    pub default_limit: u32,
    /// Hard per-category cap; caller-supplied limits clamp to this
    #[serde(default = "default_search_max_limit")]
    pub max_limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

fn default_search_max_limit() -> u32 {
    50
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_search_max_limit(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────

impl Config {
    /// Load `~/.campuslink/config.toml`, writing a default one on first
    /// run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let user_dirs = UserDirs::new()
            .ok_or_else(|| ConfigError::Load("cannot resolve home directory".into()))?;
        let workspace_dir = user_dirs.home_dir().join(".campuslink");
        Self::load_from(&workspace_dir)
    }

    pub fn load_from(workspace_dir: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(workspace_dir)?;
        let config_path = workspace_dir.join("config.toml");

        let mut config: Config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?
        } else {
            let config = Config {
                workspace_dir: workspace_dir.to_path_buf(),
                config_path: config_path.clone(),
                database: DatabaseConfig::default(),
                gateway: GatewayConfig::default(),
                search: SearchConfig::default(),
            };
            let serialized = toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            fs::write(&config_path, serialized)?;
            config
        };

        config.workspace_dir = workspace_dir.to_path_buf();
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(ConfigError::Validation(
                "search limits must be positive".into(),
            ));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::Validation(
                "search default_limit exceeds max_limit".into(),
            ));
        }
        Ok(())
    }

    /// Resolved database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        match &self.database.path {
            Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
            None => self.workspace_dir.join("campuslink.db"),
        }
    }
}
