use super::ConfigError;
use crate::templates::AgentTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const API_BASE_ENV: &str = "ROTEIRO_API_BASE";
const DEFAULT_TOKEN_ENV: &str = "ROTEIRO_API_TOKEN";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub templates: Vec<AgentTemplate>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_env: default_token_env(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    #[serde(default = "default_trigger_char")]
    pub trigger_char: String,
    #[serde(default = "default_palette_height")]
    pub palette_height: i32,
    #[serde(default = "default_min_top_margin")]
    pub min_top_margin: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            trigger_char: default_trigger_char(),
            palette_height: default_palette_height(),
            min_top_margin: default_min_top_margin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_resolve_delay_ms")]
    pub resolve_delay_ms: u64,
    #[serde(default = "default_principal_name")]
    pub principal_name: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            resolve_delay_ms: default_resolve_delay_ms(),
            principal_name: default_principal_name(),
        }
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_trigger_char() -> String {
    crate::decision::trigger::DEFAULT_TRIGGER.to_string()
}

fn default_palette_height() -> i32 {
    12
}

fn default_min_top_margin() -> i32 {
    crate::decision::trigger::DEFAULT_MIN_TOP_MARGIN
}

fn default_resolve_delay_ms() -> u64 {
    1500
}

fn default_principal_name() -> String {
    "Principal".to_string()
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut trigger = self.editor.trigger_char.chars();
        match (trigger.next(), trigger.next()) {
            (Some(ch), None) if !ch.is_whitespace() => {}
            _ => {
                return Err(ConfigError::Settings(format!(
                    "editor.trigger_char must be a single non-whitespace character, got `{}`",
                    self.editor.trigger_char
                )))
            }
        }
        if self.editor.palette_height <= 0 {
            return Err(ConfigError::Settings(
                "editor.palette_height must be greater than zero".to_string(),
            ));
        }
        if self.editor.min_top_margin < 0 {
            return Err(ConfigError::Settings(
                "editor.min_top_margin must not be negative".to_string(),
            ));
        }
        if self.batch.principal_name.trim().is_empty() {
            return Err(ConfigError::Settings(
                "batch.principal_name must be non-empty".to_string(),
            ));
        }
        if let Some(base_url) = &self.api.base_url {
            if base_url.trim().is_empty() {
                return Err(ConfigError::Settings(
                    "api.base_url must be non-empty when set".to_string(),
                ));
            }
        }
        let mut seen = HashSet::new();
        for template in &self.templates {
            if template.id.is_principal() {
                return Err(ConfigError::Settings(format!(
                    "template id `{}` is reserved",
                    template.id
                )));
            }
            if !seen.insert(template.id.as_str()) {
                return Err(ConfigError::Settings(format!(
                    "duplicate template id `{}`",
                    template.id
                )));
            }
        }
        Ok(())
    }

    pub fn trigger_char(&self) -> char {
        self.editor
            .trigger_char
            .chars()
            .next()
            .unwrap_or(crate::decision::trigger::DEFAULT_TRIGGER)
    }

    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.batch.resolve_delay_ms)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    /// `ROTEIRO_API_BASE` wins over the configured base URL.
    pub fn resolved_api_base(&self) -> Option<String> {
        std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api.base_url.clone())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api.token_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}
