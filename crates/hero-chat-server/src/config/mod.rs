pub mod settings;

pub use settings::{
    ConversationConfig, GeminiConfig, LimitsConfig, LoggingConfig, PromptsConfig, ServerConfig,
    Settings, UpstreamConfig,
};
