//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use somatoria_core::engine::{MergePolicy, ScanConfig};
use somatoria_core::error::OcrError;
use somatoria_core::traits::OcrProvider;

use crate::mock::MockOcrProvider;
use crate::vision::GoogleVisionProvider;

/// Environment variable holding the Google Cloud API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_CLOUD_API_KEY";

/// Sample key shipped in setup instructions; never a real key.
const PLACEHOLDER_API_KEY: &str = "SUA_API_KEY_AQUI";

/// Configuration for a single OCR provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProviderConfig {
    GoogleVision {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Returns canned text, one entry per page; the last entry repeats.
    Mock {
        #[serde(default)]
        pages: Vec<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::GoogleVision {
                api_key: _,
                base_url,
            } => f
                .debug_struct("GoogleVision")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { pages } => {
                f.debug_struct("Mock").field("pages", &pages.len()).finish()
            }
        }
    }
}

/// Top-level somatoria configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomatoriaConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Max retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// How detections from several images are combined.
    #[serde(default)]
    pub merge_policy: MergePolicy,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "google-vision".to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./somatoria-reports")
}

impl Default for SomatoriaConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            merge_policy: MergePolicy::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl SomatoriaConfig {
    /// Scan settings derived from this configuration.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            merge_policy: self.merge_policy,
        }
    }

    /// Look up a provider by name, or the default provider.
    pub fn provider(&self, name: Option<&str>) -> Result<(String, ProviderConfig)> {
        let name = name.unwrap_or(&self.default_provider);
        let config = self.providers.get(name).cloned().or_else(|| {
            // Google Vision works without a config entry when the key comes
            // from the environment; the factory reports a missing key.
            (name == "google-vision").then(|| ProviderConfig::GoogleVision {
                api_key: String::new(),
                base_url: None,
            })
        });
        match config {
            Some(config) => Ok((name.to_string(), config)),
            None => {
                let mut known: Vec<&str> = self.providers.keys().map(String::as_str).collect();
                known.sort_unstable();
                anyhow::bail!(
                    "provider '{name}' not found in config (configured: {})",
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            }
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::GoogleVision { api_key, base_url } => ProviderConfig::GoogleVision {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Mock { pages } => ProviderConfig::Mock {
            pages: pages.clone(),
        },
    }
}

/// An API key that is empty or still the setup placeholder.
fn is_unset_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key == PLACEHOLDER_API_KEY
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `somatoria.toml` in the current directory
/// 2. `~/.config/somatoria/config.toml`
///
/// Environment variable override: `GOOGLE_CLOUD_API_KEY`.
pub fn load_config() -> Result<SomatoriaConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SomatoriaConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("somatoria.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<SomatoriaConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SomatoriaConfig::default(),
    };

    Ok(apply_env_overrides(
        config,
        std::env::var(GOOGLE_API_KEY_ENV).ok(),
    ))
}

/// Apply the Google API key override, then resolve `${VAR}` references.
fn apply_env_overrides(mut config: SomatoriaConfig, google_key: Option<String>) -> SomatoriaConfig {
    if let Some(key) = google_key.filter(|k| !is_unset_key(k)) {
        let entry = config
            .providers
            .entry("google-vision".into())
            .or_insert(ProviderConfig::GoogleVision {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::GoogleVision { api_key, .. } = entry {
            *api_key = key;
        }
    }

    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("somatoria"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Arc<dyn OcrProvider>> {
    match config {
        ProviderConfig::GoogleVision { api_key, base_url } => {
            if is_unset_key(api_key) {
                return Err(OcrError::MissingApiKey(name.to_string()))
                    .context(format!("set {GOOGLE_API_KEY_ENV} or providers.{name}.api_key"));
            }
            Ok(Arc::new(GoogleVisionProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::Mock { pages } => Ok(Arc::new(MockOcrProvider::with_pages(pages.clone()))),
    }
}
