use crate::models::{HeaderOptions, QueryOptions};
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_EMBEDDING_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingMode {
    /// Remote embeddings when an API key is configured, keyword search otherwise.
    #[default]
    Auto,
    Remote,
    Local,
    Disabled,
}

impl FromStr for EmbeddingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EmbeddingMode::Auto),
            "remote" => Ok(EmbeddingMode::Remote),
            "local" => Ok(EmbeddingMode::Local),
            "disabled" | "none" | "off" => Ok(EmbeddingMode::Disabled),
            other => Err(format!("unknown embedding mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Auto,
            api_key: None,
            endpoint: DEFAULT_EMBEDDING_ENDPOINT.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Reads `EMBEDDING_MODE`, `GEMINI_API_KEY`, `EMBEDDING_ENDPOINT` and
    /// `EMBEDDING_MODEL`.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("EMBEDDING_MODE").ok(),
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("EMBEDDING_ENDPOINT").ok(),
            std::env::var("EMBEDDING_MODEL").ok(),
        )
    }

    pub fn from_values(
        mode: Option<String>,
        api_key: Option<String>,
        endpoint: Option<String>,
        model: Option<String>,
    ) -> Self {
        let defaults = Self::default();

        let mode = match non_blank(mode) {
            Some(raw) => raw.parse().unwrap_or_else(|error: String| {
                warn!(error = %error, "falling back to auto embedding mode");
                EmbeddingMode::Auto
            }),
            None => EmbeddingMode::Auto,
        };

        Self {
            mode,
            api_key: non_blank(api_key),
            endpoint: non_blank(endpoint).unwrap_or(defaults.endpoint),
            model: non_blank(model).unwrap_or(defaults.model),
        }
    }

    /// Mode after resolving `Auto` against the presence of a credential.
    pub fn effective_mode(&self) -> EmbeddingMode {
        match (self.mode, &self.api_key) {
            (EmbeddingMode::Auto, Some(_)) => EmbeddingMode::Remote,
            (EmbeddingMode::Auto, None) => EmbeddingMode::Disabled,
            (mode, _) => mode,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub header: HeaderOptions,
    pub query: QueryOptions,
    pub embedding: EmbeddingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_needs_a_key_for_remote() {
        let without_key = EmbeddingConfig::from_values(None, Some("  ".to_string()), None, None);
        assert_eq!(without_key.api_key, None);
        assert_eq!(without_key.effective_mode(), EmbeddingMode::Disabled);

        let with_key = EmbeddingConfig::from_values(None, Some("secret".to_string()), None, None);
        assert_eq!(with_key.effective_mode(), EmbeddingMode::Remote);
        assert_eq!(with_key.endpoint, DEFAULT_EMBEDDING_ENDPOINT);
    }

    #[test]
    fn explicit_mode_wins_over_key() {
        let config = EmbeddingConfig::from_values(
            Some("Local".to_string()),
            Some("secret".to_string()),
            None,
            Some("custom-model".to_string()),
        );
        assert_eq!(config.effective_mode(), EmbeddingMode::Local);
        assert_eq!(config.model, "custom-model");
    }

    #[test]
    fn unknown_mode_falls_back_to_auto() {
        let config = EmbeddingConfig::from_values(Some("quantum".to_string()), None, None, None);
        assert_eq!(config.mode, EmbeddingMode::Auto);
        assert_eq!("off".parse::<EmbeddingMode>(), Ok(EmbeddingMode::Disabled));
    }
}
