use crate::adapters::llm::ModelConfig;
use crate::core::CommentStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,

    #[serde(default)]
    pub comment_style: CommentStyle,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
            api_key: None,
            base_url: None,
            comment_style: CommentStyle::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut candidates = vec![
            PathBuf::from(".code-commenter.yml"),
            PathBuf::from(".code-commenter.yaml"),
        ];
        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(".code-commenter.yml"));
        }

        for path in candidates {
            if path.exists() {
                return Self::from_path(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    pub fn merge_with_cli(&mut self, cli_model: Option<String>, cli_prompt: Option<String>) {
        if let Some(model) = cli_model {
            self.model = model;
        }
        if let Some(prompt) = cli_prompt {
            self.system_prompt = Some(prompt);
        }
    }

    pub fn normalize(&mut self) {
        self.temperature = self.temperature.clamp(0.0, 2.0);
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self
            .system_prompt
            .as_ref()
            .map_or(false, |prompt| prompt.trim().is_empty())
        {
            self.system_prompt = None;
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.model.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> usize {
    4000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.comment_style, CommentStyle::Separate);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "model: claude-3-5-sonnet\ntemperature: 0.7\ncomment_style: inline\nserver:\n  bind: 0.0.0.0:9000"
        )
        .unwrap();

        let config = Config::from_path(file.path()).unwrap();
        assert_eq!(config.model, "claude-3-5-sonnet");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.comment_style, CommentStyle::Inline);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn invalid_yaml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "comment_style: sideways").unwrap();

        let err = Config::from_path(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config"));
    }

    #[test]
    fn cli_values_override_file() {
        let mut config = Config::default();
        config.merge_with_cli(Some("gpt-4o".to_string()), Some("Be brief.".to_string()));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));

        config.merge_with_cli(None, None);
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn normalize_fixes_out_of_range_values() {
        let mut config = Config {
            temperature: 5.0,
            max_tokens: 0,
            timeout_secs: 0,
            system_prompt: Some("  ".to_string()),
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.system_prompt.is_none());
    }
}
