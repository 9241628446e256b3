pub mod chat;
pub mod config;
pub mod document;
pub mod error;

pub use chat::*;
pub use config::*;
pub use document::*;
pub use error::*;
