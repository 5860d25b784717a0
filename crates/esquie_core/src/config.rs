//! Configuration for the Esquie bot
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables, so a plain `.env` with `DISCORD_BOT_TOKEN` is enough
//! to run the bot.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "esquie.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EsquieConfig {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    #[serde(default, skip_serializing)]
    pub token: String,

    /// Name the bot introduces itself with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Custom status shown under the bot's name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Hosted completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub endpoint: String,
    pub model: String,
    /// Model used for the image description pass
    pub vision_model: String,
    /// Sampling seed pinned on every request
    pub seed: u64,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://text.pollinations.ai/openai".to_string(),
            model: "openai".to_string(),
            vision_model: "openai".to_string(),
            seed: 42,
            timeout_secs: 60,
            system_prompt:
                "You are a helpful AI assistant that responds naturally to user messages."
                    .to_string(),
        }
    }
}

/// Conversation policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// How many messages up the reply chain to look
    pub history_max_depth: usize,

    /// Prompts shorter than this (in characters) get expanded
    pub short_prompt_threshold: usize,

    /// Prefix prompts with sender and mention metadata
    pub prompt_metadata: bool,

    /// Describe image attachments before answering
    pub describe_images: bool,

    pub max_images: usize,

    /// Reactions that ask the bot to delete its answer
    pub delete_emojis: Vec<String>,

    pub thinking_placeholder: String,

    /// Sent in place of an answer when the completion API fails
    pub fallback_reply: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            history_max_depth: 10,
            short_prompt_threshold: 3,
            prompt_metadata: false,
            describe_images: true,
            max_images: 4,
            delete_emojis: vec!["🗑️".to_string(), "❌".to_string()],
            thinking_placeholder: "🤔 Thinking...".to_string(),
            fallback_reply: "Sorry, I'm having trouble connecting to my AI brain right now. \
                             Please try again later!"
                .to_string(),
        }
    }
}

impl EsquieConfig {
    /// Load configuration from the config file (if any) and the environment,
    /// then validate it.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Same as [`EsquieConfig::load`], reading variables through `lookup`.
    ///
    /// An explicit `ESQUIE_CONFIG` must point at a readable file; the default
    /// path is optional.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let explicit_path = lookup("ESQUIE_CONFIG").filter(|v| !v.trim().is_empty());

        let (config_path, mut config) = match explicit_path {
            Some(path) => {
                let config = Self::from_file(&path)?;
                (path, config)
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                (DEFAULT_CONFIG_PATH.to_string(), Self::from_file(DEFAULT_CONFIG_PATH)?)
            }
            None => (DEFAULT_CONFIG_PATH.to_string(), Self::default()),
        };

        config.override_from(&lookup)?;
        config.validate(&config_path)?;
        Ok(config)
    }

    /// Parse a TOML config file without applying environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|cause| ConfigError::Unreadable {
            path: path.display().to_string(),
            cause,
        })?;

        toml::from_str(&contents).map_err(|cause| ConfigError::ParseFailed {
            path: path.display().to_string(),
            cause,
        })
    }

    /// Override values with whatever `lookup` returns for the recognized
    /// environment variable names.
    pub fn override_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        // Discord
        if let Some(token) = lookup("DISCORD_BOT_TOKEN") {
            self.discord.token = token.trim().to_string();
        }
        if let Some(name) = lookup("BOT_DISPLAY_NAME").filter(|v| !v.trim().is_empty()) {
            self.discord.display_name = Some(name);
        }
        if let Some(status) = lookup("BOT_STATUS").filter(|v| !v.trim().is_empty()) {
            self.discord.status = Some(status);
        }

        // Completion API
        if let Some(url) = lookup("POLLINATIONS_URL") {
            self.ai.endpoint = url;
        }
        if let Some(model) = lookup("AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(model) = lookup("AI_VISION_MODEL") {
            self.ai.vision_model = model;
        }
        if let Some(seed) = lookup("AI_SEED") {
            self.ai.seed = parse_var("AI_SEED", &seed)?;
        }
        if let Some(secs) = lookup("AI_TIMEOUT_SECS") {
            self.ai.timeout_secs = parse_var("AI_TIMEOUT_SECS", &secs)?;
        }
        if let Some(prompt) = lookup("SYSTEM_PROMPT") {
            self.ai.system_prompt = prompt;
        }

        // Behavior
        if let Some(depth) = lookup("HISTORY_MAX_DEPTH") {
            self.behavior.history_max_depth = parse_var("HISTORY_MAX_DEPTH", &depth)?;
        }
        if let Some(threshold) = lookup("SHORT_PROMPT_THRESHOLD") {
            self.behavior.short_prompt_threshold =
                parse_var("SHORT_PROMPT_THRESHOLD", &threshold)?;
        }
        if let Some(flag) = lookup("PROMPT_METADATA") {
            self.behavior.prompt_metadata = parse_flag("PROMPT_METADATA", &flag)?;
        }
        if let Some(flag) = lookup("DESCRIBE_IMAGES") {
            self.behavior.describe_images = parse_flag("DESCRIBE_IMAGES", &flag)?;
        }
        if let Some(emojis) = lookup("DELETE_EMOJIS") {
            self.behavior.delete_emojis = emojis
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(())
    }

    /// Check required fields. `config_path` is only used in diagnostics.
    pub fn validate(&self, config_path: &str) -> Result<()> {
        if self.discord.token.is_empty() {
            return Err(ConfigError::MissingToken {
                config_path: config_path.to_string(),
            });
        }

        if !(self.ai.endpoint.starts_with("http://") || self.ai.endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Invalid {
                field: "ai.endpoint".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.ai.endpoint),
            });
        }

        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "ai.timeout_secs".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        field: name.to_string(),
        reason: format!("'{value}' could not be parsed: {e}"),
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            field: name.to_string(),
            reason: format!("'{value}' is not a boolean (use true or false)"),
        }),
    }
}
