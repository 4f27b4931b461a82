pub mod config;
pub mod core;
pub mod transport;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ClientConfig, ConfigError};
pub use crate::core::*;
