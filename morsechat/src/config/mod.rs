//! Configuration system for the MorseChat client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/morsechat/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error. The cipher key has no
//! default: it must come from `--cipher-key`, `MORSECHAT_CIPHER_KEY` or the
//! `[security]` section.

use std::path::PathBuf;
use std::time::Duration;

use crate::cipher::CipherKey;
use crate::net::NetConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// No cipher key was configured anywhere.
    #[error(
        "no cipher key configured (set --cipher-key, MORSECHAT_CIPHER_KEY, or [security] cipher_key)"
    )]
    MissingCipherKey,

    /// A configured value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    network: NetworkFileConfig,
    security: SecurityFileConfig,
    ui: UiFileConfig,
}

/// `[network]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NetworkFileConfig {
    server_url: Option<String>,
    connect_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[security]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SecurityFileConfig {
    cipher_key: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Network --
    /// Hub WebSocket URL.
    pub server_url: String,
    /// Timeout for connecting to the hub.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,

    // -- Security --
    /// Pre-shared cipher key.
    pub cipher_key: Option<CipherKey>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:4000/ws".to_string(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            cipher_key: None,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/morsechat/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a resolved value is out of range.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        config.validate()?;
        Ok(config)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            server_url: cli
                .server_url
                .clone()
                .or_else(|| file.network.server_url.clone())
                .unwrap_or(defaults.server_url),
            connect_timeout: file
                .network
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            channel_capacity: file
                .network
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            cipher_key: cli
                .cipher_key
                .clone()
                .or_else(|| file.security.cipher_key.clone())
                .filter(|k| !k.is_empty())
                .map(CipherKey::new),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a [`NetConfig`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCipherKey`] if no cipher key was set.
    pub fn to_net_config(&self) -> Result<NetConfig, ConfigError> {
        let cipher_key = self
            .cipher_key
            .clone()
            .ok_or(ConfigError::MissingCipherKey)?;

        Ok(NetConfig {
            server_url: self.server_url.clone(),
            cipher_key,
            connect_timeout: self.connect_timeout,
            channel_capacity: self.channel_capacity,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Encrypted Morse code chat")]
pub struct CliArgs {
    /// WebSocket URL of the hub.
    #[arg(long, env = "MORSECHAT_SERVER_URL")]
    pub server_url: Option<String>,

    /// Pre-shared cipher key. Every participant must use the same key.
    #[arg(long, env = "MORSECHAT_CIPHER_KEY", hide_env_values = true)]
    pub cipher_key: Option<String>,

    /// Path to config file (default: `~/.config/morsechat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "MORSECHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/morsechat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("morsechat").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
