pub mod client;
pub mod config;
pub mod core;
pub mod terminal;
pub mod utils;

// Re-export commonly used items for convenience
pub use client::{AvatarClient, ClientError, ClientResult, UserInput};
pub use config::ClientConfig;
pub use core::*;
