// Persistent guild configuration storage
pub mod config_store;
pub mod error;

pub use config_store::ConfigStore;
pub use error::ConfigError;
