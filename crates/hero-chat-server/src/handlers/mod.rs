pub mod chat;
pub mod gemini;
pub mod health;
pub mod heroes;
