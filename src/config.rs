use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings are overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Get all overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bungie: BungieConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

/// Bungie.net application registration and endpoints.
#[derive(Clone, Deserialize)]
pub struct BungieConfig {
    /// `X-API-Key` issued with the application registration.
    #[serde(default)]
    pub api_key: String,
    /// OAuth client id of the application registration.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Base of the Platform API, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl std::fmt::Debug for BungieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "********" };
        f.debug_struct("BungieConfig")
            .field("api_key", &api_key)
            .field("client_id", &self.client_id)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Default for BungieConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            client_id: default_client_id(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Keyring,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(format!("Unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            dir: default_storage_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_client_id() -> String {
    "50382".to_string()
}
fn default_auth_url() -> String {
    "https://www.bungie.net/en/oauth/authorize".to_string()
}
fn default_token_url() -> String {
    "https://www.bungie.net/Platform/App/OAuth/token/".to_string()
}
fn default_api_base_url() -> String {
    "https://www.bungie.net/Platform".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
const fn default_port() -> u16 {
    8420
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}
fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bungie-link")
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading, env overrides, and validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. `BUNGIE_*` and `BUNGIE_LINK_*` variables take precedence
    /// over the file value and are tracked in `env_overrides`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check that the deploy-time settings needed for a login are present.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bungie.api_key.trim().is_empty() {
            anyhow::bail!("bungie.api_key is not set (use BUNGIE_API_KEY)");
        }
        if self.bungie.client_id.trim().is_empty() {
            anyhow::bail!("bungie.client_id is not set (use BUNGIE_CLIENT_ID)");
        }
        for (key, value) in [
            ("bungie.auth_url", &self.bungie.auth_url),
            ("bungie.token_url", &self.bungie.token_url),
            ("bungie.api_base_url", &self.bungie.api_base_url),
        ] {
            url::Url::parse(value).map_err(|e| anyhow::anyhow!("{key} is not a valid URL: {e}"))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }

        // -- Bungie --
        env_str!("bungie.api_key", "BUNGIE_API_KEY", self.bungie.api_key);
        env_str!("bungie.client_id", "BUNGIE_CLIENT_ID", self.bungie.client_id);
        env_str!("bungie.auth_url", "BUNGIE_AUTH_URL", self.bungie.auth_url);
        env_str!("bungie.token_url", "BUNGIE_TOKEN_URL", self.bungie.token_url);
        env_str!(
            "bungie.api_base_url",
            "BUNGIE_API_BASE_URL",
            self.bungie.api_base_url
        );

        // -- Server --
        env_str!("server.host", "BUNGIE_LINK_HOST", self.server.host);
        env_parse!("server.port", "BUNGIE_LINK_PORT", self.server.port);

        // -- Storage --
        env_parse!(
            "storage.backend",
            "BUNGIE_LINK_STORAGE_BACKEND",
            self.storage.backend
        );
        if let Ok(val) = std::env::var("BUNGIE_LINK_STORAGE_DIR") {
            self.storage.dir = PathBuf::from(val);
            ov.record("storage.dir", "BUNGIE_LINK_STORAGE_DIR");
        }

        // -- Logging --
        env_str!("logging.level", "BUNGIE_LINK_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "BUNGIE_LINK_LOG_JSON", self.logging.json);

        self.bungie.api_base_url = self.bungie.api_base_url.trim_end_matches('/').to_string();
        self.env_overrides = ov;
    }
}

// Helper for default storage directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
