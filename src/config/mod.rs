use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Which store serves the requests
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Redis,
  /// Process-local store, contents are lost on restart
  Memory,
}

impl std::str::FromStr for Backend {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "redis" => Ok(Backend::Redis),
      "memory" | "in-memory" => Ok(Backend::Memory),
      other => anyhow::bail!("unknown store backend '{}'", other),
    }
  }
}

/// Backing store configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
  pub backend: Backend,
  pub host: String,
  pub port: u16,
  pub password: Option<String>,
  /// Logical database index
  pub db: i64,
  /// Upper bound for a single store call in milliseconds, 0 disables it
  pub timeout_ms: u64,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend: Backend::Redis,
      host: "127.0.0.1".to_string(),
      port: 6379,
      password: None,
      db: 0,
      timeout_ms: 2000,
    }
  }
}

impl StoreConfig {
  pub fn timeout(&self) -> Option<Duration> {
    (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
  }
}

/// kvgate configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
  /// HTTP listening address
  #[serde(default = "default_server_addr")]
  pub server_addr: String,

  /// Directory holding the HTML form pages
  #[serde(default = "default_static_dir")]
  pub static_dir: PathBuf,

  #[serde(default)]
  pub store: StoreConfig,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

fn default_server_addr() -> String {
  "0.0.0.0:3000".to_string()
}

fn default_static_dir() -> PathBuf {
  PathBuf::from("./static")
}

impl Default for Config {
  fn default() -> Self {
    Self {
      server_addr: default_server_addr(),
      static_dir: default_static_dir(),
      store: StoreConfig::default(),
      log: LogConfig::default(),
    }
  }
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: &Path) -> anyhow::Result<Self> {
    let config_str = fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    toml::from_str(&config_str)
      .with_context(|| format!("Failed to parse config file '{}'", path.display()))
  }

  /// Override settings from `KVGATE_*` variables resolved through `lookup`.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    if let Some(addr) = lookup("KVGATE_LISTEN") {
      self.server_addr = addr;
    }
    if let Some(dir) = lookup("KVGATE_STATIC_DIR") {
      self.static_dir = PathBuf::from(dir);
    }
    if let Some(backend) = lookup("KVGATE_STORE_BACKEND") {
      self.store.backend = backend.parse()?;
    }
    if let Some(host) = lookup("KVGATE_REDIS_HOST") {
      self.store.host = host;
    }
    if let Some(port) = lookup("KVGATE_REDIS_PORT") {
      self.store.port = port
        .parse()
        .with_context(|| format!("KVGATE_REDIS_PORT is not a port: '{}'", port))?;
    }
    if let Some(password) = lookup("KVGATE_REDIS_PASSWORD") {
      self.store.password = Some(password);
    }
    if let Some(db) = lookup("KVGATE_REDIS_DB") {
      self.store.db = db
        .parse()
        .with_context(|| format!("KVGATE_REDIS_DB is not a database index: '{}'", db))?;
    }
    if let Some(ms) = lookup("KVGATE_STORE_TIMEOUT_MS") {
      self.store.timeout_ms = ms
        .parse()
        .with_context(|| format!("KVGATE_STORE_TIMEOUT_MS is not a number: '{}'", ms))?;
    }
    Ok(())
  }
}
