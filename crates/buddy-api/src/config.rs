use buddy_context::{ContextBudget, EstimatorKind, ReplyTemplates, DEFAULT_BLOCK_OVERHEAD, DEFAULT_MAX_OUTPUT_TOKENS};
use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;

/// Env vars that override single config keys.
///
/// Listed explicitly because keys such as `bot.use_gpt4` contain the `_`
/// separator themselves.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_TIMEOUT_SECS", "server.timeout_secs"),
    ("BOT_NAME", "bot.name"),
    ("BOT_PERSONALITY", "bot.personality"),
    ("BOT_USE_GPT4", "bot.use_gpt4"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_BASE_URL", "llm.base_url"),
    ("LLM_TIMEOUT_SECS", "llm.timeout_secs"),
    ("CONTEXT_ESTIMATOR", "context.estimator"),
    ("CONTEXT_BLOCK_OVERHEAD", "context.block_overhead"),
    ("CONTEXT_WINDOW", "context.context_window"),
    ("CONTEXT_MAX_OUTPUT_TOKENS", "context.max_output_tokens"),
    ("STORAGE_BACKEND", "storage.backend"),
    ("STORAGE_DATABASE", "storage.database"),
    ("DISCORD_AUTOSTART", "discord.autostart"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub replies: ReplyTemplates,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub discord_bot_token: Option<String>,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub name: String,
    pub personality: String,
    #[serde(default)]
    pub use_gpt4: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Overrides the model picked from `bot.use_gpt4`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            base_url: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub estimator: EstimatorKind,
    #[serde(default = "default_block_overhead")]
    pub block_overhead: usize,
    /// Overrides the model's default window
    #[serde(default)]
    pub context_window: Option<usize>,
    /// Reserved for the reply and sent to the model as `max_tokens`
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::default(),
            block_overhead: default_block_overhead(),
            context_window: None,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Connect the gateway at startup instead of waiting for `POST /start`
    #[serde(default = "default_true")]
    pub autostart: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self { autostart: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn default_request_timeout() -> u64 {
    300
}

fn default_temperature() -> f32 {
    0.8
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_block_overhead() -> usize {
    DEFAULT_BLOCK_OVERHEAD
}

fn default_max_output_tokens() -> usize {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_database() -> String {
    "chat_buddy".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, BOT_, LLM_, CONTEXT_, STORAGE_,
    ///    DISCORD_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));
        let builder = apply_env_overrides(builder, |key| std::env::var(key).ok())?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets from ENV (not in TOML)
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string()))?;
        cfg.discord_bot_token = non_empty_env("DISCORD_BOT_TOKEN");
        cfg.mongodb_uri = non_empty_env("MONGODB_URI");

        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document with env-style overrides from `lookup`
    pub fn from_toml_str(toml: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from_str(toml, FileFormat::Toml));
        let cfg: Config = apply_env_overrides(builder, lookup)?.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb_uri.is_none() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required when storage.backend = \"mongodb\"".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Message(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    /// Model name sent to the chat backend
    pub fn model(&self) -> String {
        match &self.llm.model {
            Some(model) if !model.trim().is_empty() => model.clone(),
            _ if self.bot.use_gpt4 => "gpt-4".to_string(),
            _ => "gpt-3.5-turbo".to_string(),
        }
    }

    pub fn budget(&self) -> ContextBudget {
        let defaults = ContextBudget::for_model(&self.model(), self.context.max_output_tokens);
        match self.context.context_window {
            Some(window) => ContextBudget::new(window, self.context.max_output_tokens),
            None => defaults,
        }
    }

    /// Text of the system block that seeds every new conversation
    pub fn persona(&self) -> String {
        format!(
            "Your name is {}. Your personality is {}.",
            self.bot.name, self.bot.personality
        )
    }
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(*key, value)?;
        }
    }
    Ok(builder)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TOML: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [cors]
        enabled = true
        origins = ["http://localhost:3000"]

        [bot]
        name = "Ada"
        personality = "dry and witty"

        [logging]
        level = "debug"
        format = "json"
    "#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_config_structure() {
        let config: Config = toml::from_str(TOML).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.timeout_secs, 300);
        assert_eq!(config.bot.name, "Ada");
        assert!(!config.bot.use_gpt4);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.context.estimator, EstimatorKind::Chars);
        assert!(config.discord.autostart);
    }

    #[test]
    fn test_persona_text() {
        let config = Config::from_toml_str(TOML, no_env).unwrap();
        assert_eq!(config.persona(), "Your name is Ada. Your personality is dry and witty.");
    }

    #[test]
    fn test_model_and_budget_selection() {
        let config = Config::from_toml_str(TOML, no_env).unwrap();
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert_eq!(config.budget().prompt_tokens(), 4097 - 256);

        let env: HashMap<&str, &str> = [("BOT_USE_GPT4", "true"), ("CONTEXT_MAX_OUTPUT_TOKENS", "800")].into();
        let config = Config::from_toml_str(TOML, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.model(), "gpt-4");
        assert_eq!(config.budget().prompt_tokens(), 7800 - 800);
    }

    #[test]
    fn test_model_override_and_explicit_window() {
        let env: HashMap<&str, &str> = [("LLM_MODEL", "gpt-4o-mini"), ("CONTEXT_WINDOW", "2000")].into();
        let config = Config::from_toml_str(TOML, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.budget(), ContextBudget::new(2000, 256));
    }

    #[test]
    fn test_mongodb_backend_requires_uri() {
        let env: HashMap<&str, &str> = [("STORAGE_BACKEND", "mongodb")].into();
        let err = Config::from_toml_str(TOML, |k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(err.to_string().contains("MONGODB_URI"));
    }

    #[test]
    fn test_reply_templates_from_toml() {
        let toml = format!("{}\n[replies]\nusage_limit = \"No more credits.\"\n", TOML);
        let config = Config::from_toml_str(&toml, no_env).unwrap();
        assert_eq!(config.replies.usage_limit, "No more credits.");
        assert_eq!(config.replies.error_prefix, ReplyTemplates::default().error_prefix);
    }
}
