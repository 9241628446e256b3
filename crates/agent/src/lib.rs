pub mod agent;
pub mod client;
pub mod tools;

pub use agent::*;
pub use client::*;
pub use tools::*;
