pub mod chat;
pub mod hero;

pub use chat::{SessionId, Speaker, Turn};
pub use hero::HeroRecord;
