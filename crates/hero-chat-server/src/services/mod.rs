pub mod conversation;
pub mod domain_classifier;
pub mod gemini;
pub mod hero_catalog;

pub use conversation::{ConversationEngine, SessionStore};
pub use domain_classifier::{DomainClassifier, KeywordClassifier};
pub use gemini::{GeminiService, GenerationError, TextGenerator};
pub use hero_catalog::{CatalogError, HeroCatalog};
