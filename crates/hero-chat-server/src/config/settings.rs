use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub gemini: GeminiConfig,
    pub conversation: ConversationConfig,
    pub limits: LimitsConfig,
    pub prompts: PromptsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// OpenDota hero catalog
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// 0 disables the catalog cache (every lookup re-fetches)
    pub cache_ttl_seconds: u64,
}

impl UpstreamConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_seconds > 0).then(|| Duration::from_secs(self.cache_ttl_seconds))
    }
}

#[derive(Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

// Never print the credential.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationConfig {
    pub max_history: usize,
    pub keep_tail: usize,
    /// 0 disables idle eviction
    pub idle_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub default_session_id: String,
}

impl ConversationConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_seconds > 0).then(|| Duration::from_secs(self.idle_ttl_seconds))
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            keep_tail: 10,
            idle_ttl_seconds: 6 * 60 * 60,
            sweep_interval_seconds: 5 * 60,
            default_session_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    pub generation_concurrency: usize,
    pub acquire_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            generation_concurrency: 8,
            acquire_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    pub system_instruction: String,
    pub refusal_message: String,
    pub advice_template: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            refusal_message: DEFAULT_REFUSAL_MESSAGE.to_string(),
            advice_template: DEFAULT_ADVICE_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily rolling file in this directory
    pub directory: Option<String>,
}

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a professional Dota 2 player and coach. \
Answer only questions about Dota 2: heroes, abilities, items, builds, roles, strategy, \
patches, the map and tournaments. If a question is not about Dota 2, politely refuse \
and remind the user that you only discuss Dota 2.";

pub const DEFAULT_REFUSAL_MESSAGE: &str =
    "Sorry, I can only answer questions about Dota 2 (heroes, items, strategy, patches, tournaments).";

/// `{hero}` and `{role}` are substituted at request time
pub const DEFAULT_ADVICE_TEMPLATE: &str = "You are a professional Dota 2 player. Explain how to play \
the hero {hero} in the {role} role. Give advice on abilities, item builds, positioning, \
and the hero's strengths and weaknesses.";

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let conversation = ConversationConfig::default();
        let limits = LimitsConfig::default();
        let prompts = PromptsConfig::default();

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("upstream.base_url", "https://api.opendota.com/api")?
            .set_default("upstream.timeout_seconds", 10)?
            .set_default("upstream.cache_ttl_seconds", 0)?
            .set_default("gemini.api_key", "")?
            .set_default(
                "gemini.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("gemini.model", "gemini-1.5-flash")?
            .set_default("gemini.timeout_seconds", 60)?
            .set_default("conversation.max_history", conversation.max_history as u64)?
            .set_default("conversation.keep_tail", conversation.keep_tail as u64)?
            .set_default("conversation.idle_ttl_seconds", conversation.idle_ttl_seconds)?
            .set_default(
                "conversation.sweep_interval_seconds",
                conversation.sweep_interval_seconds,
            )?
            .set_default("conversation.default_session_id", conversation.default_session_id)?
            .set_default("limits.generation_concurrency", limits.generation_concurrency as u64)?
            .set_default("limits.acquire_timeout_ms", limits.acquire_timeout_ms)?
            .set_default("prompts.system_instruction", prompts.system_instruction)?
            .set_default("prompts.refusal_message", prompts.refusal_message)?
            .set_default("prompts.advice_template", prompts.advice_template)?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        // Plain GEMINI_API_KEY wins over file values
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            builder = builder.set_override("gemini.api_key", key)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}
