//! Application configuration for skinscan.
//!
//! User config lives at `~/.skinscan/skinscan.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkinScanError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "skinscan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".skinscan";

// ---------------------------------------------------------------------------
// Config structs (matching skinscan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote analysis endpoint settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

/// Which object storage backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Supabase-compatible storage REST API.
    Rest,
    /// Local directory, served by some static file server.
    Local,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Base URL of the storage REST API.
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the storage key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Bucket that receives uploaded images.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Logical namespace inside the bucket.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Cache lifetime in seconds sent with each upload.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,

    /// Root directory for the local backend.
    #[serde(default = "default_local_root")]
    pub local_root: String,

    /// URL under which `local_root` is served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: default_storage_endpoint(),
            api_key_env: default_api_key_env(),
            bucket: default_bucket(),
            prefix: default_prefix(),
            cache_control: default_cache_control(),
            local_root: default_local_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Rest
}
fn default_storage_endpoint() -> String {
    "http://localhost:54321".into()
}
fn default_api_key_env() -> String {
    "SKINSCAN_STORAGE_KEY".into()
}
fn default_bucket() -> String {
    "skin_image".into()
}
fn default_prefix() -> String {
    "uploads".into()
}
fn default_cache_control() -> String {
    "3600".into()
}
fn default_local_root() -> String {
    "~/skinscan-uploads".into()
}
fn default_public_base_url() -> String {
    "http://localhost:8080".into()
}

/// `[analyzer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Endpoint receiving the analysis POST.
    #[serde(default = "default_analyzer_endpoint")]
    pub endpoint: String,

    /// Request timeout. Absent means wait for the remote side indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analyzer_endpoint(),
            timeout_secs: None,
        }
    }
}

fn default_analyzer_endpoint() -> String {
    "http://localhost:5678/webhook/skin-analysis".into()
}

// ---------------------------------------------------------------------------
// Publish config (runtime, derived from config)
// ---------------------------------------------------------------------------

/// Runtime settings for the blob publisher.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub bucket: String,
    pub prefix: String,
    pub cache_control: String,
}

impl From<&AppConfig> for PublishConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            prefix: config.storage.prefix.clone(),
            cache_control: config.storage.cache_control.clone(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.skinscan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SkinScanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.skinscan/skinscan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkinScanError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        SkinScanError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    url::Url::parse(&config.analyzer.endpoint).map_err(|e| {
        SkinScanError::config(format!(
            "invalid analyzer endpoint '{}': {e}",
            config.analyzer.endpoint
        ))
    })?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SkinScanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SkinScanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SkinScanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Read the storage key from the configured env var.
///
/// Only the REST backend needs one; the local backend never calls this.
pub fn validate_storage_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.storage.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(SkinScanError::config(format!(
            "storage key not found. Set the {var_name} environment variable."
        ))),
    }
}
