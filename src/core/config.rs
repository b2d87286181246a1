//! Application configuration
//!
//! Loaded once at startup from a JSON (or TOML) document. Anything missing
//! falls back to the built-in defaults; an unreadable file yields the
//! defaults wholesale rather than an error.

use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Model block used when `settings.api_model` is not set
pub const DEFAULT_API_MODEL: &str = "grok-2-latest";

/// Prompt template keys for plain (name only) requests
pub const PLAIN_PROMPT_KEYS: &[&str] = &["personaje", "character"];

/// Prompt template keys for detailed requests
pub const DETAILED_PROMPT_KEYS: &[&str] = &["personaje_detallado", "character_detailed"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    /// Path to the Data Store document
    pub data_file: PathBuf,
    pub settings: Settings,
    pub api: ApiSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Character Forge".into(),
            data_file: PathBuf::from("personajes_data.json"),
            settings: Settings::default(),
            api: ApiSection::default(),
        }
    }
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_mode: crate::core::types::Mode,
    /// Persist the history after each generation run
    pub save_history: bool,
    pub history_file: PathBuf,
    /// Which model-keyed block under `api` to use
    pub api_model: String,
    /// Pause between remote requests of one batch
    ///
    /// The remote service enforces a rate limit; one second keeps a batch
    /// of ten well under it.
    pub batch_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Fixed RNG seed; entropy when unset
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: crate::core::types::Mode::Offline,
            save_history: false,
            history_file: PathBuf::from("historico_personajes.json"),
            api_model: DEFAULT_API_MODEL.into(),
            batch_delay_ms: 1000,
            request_timeout_secs: 60,
            seed: None,
        }
    }
}

/// Credentials and endpoint for one model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelBlock {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
}

/// The `api` section: model-keyed blocks next to a `prompts` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub prompts: BTreeMap<String, String>,
    #[serde(flatten)]
    pub models: BTreeMap<String, ModelBlock>,
}

/// Everything the remote generator needs for one exchange
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteServiceConfig {
    pub endpoint: String,
    pub model_id: String,
    pub credential: String,
    pub plain_template: Option<String>,
    pub detailed_template: Option<String>,
}

impl RemoteServiceConfig {
    pub fn template(&self, detailed: bool) -> Option<&str> {
        if detailed {
            self.detailed_template.as_deref()
        } else {
            self.plain_template.as_deref()
        }
        .filter(|t| !t.trim().is_empty())
    }
}

impl AppConfig {
    /// Load a config document, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load configuration from {} ({}), using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load a config document; `.toml` files are read as TOML, anything else as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Resolve the remote service block selected by `settings.api_model`.
    ///
    /// Returns `None` when the block is absent or carries no credential.
    pub fn remote_service(&self) -> Option<RemoteServiceConfig> {
        let block = self.api.models.get(&self.settings.api_model)?;
        if block.api_key.trim().is_empty() {
            return None;
        }

        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| self.api.prompts.get(*key))
                .cloned()
        };

        Some(RemoteServiceConfig {
            endpoint: block.api_base_url.trim_end_matches('/').to_string(),
            model_id: block.model.clone(),
            credential: block.api_key.clone(),
            plain_template: pick(PLAIN_PROMPT_KEYS),
            detailed_template: pick(DETAILED_PROMPT_KEYS),
        })
    }
}
