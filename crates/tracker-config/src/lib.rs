pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, DisplayConfig, LoggingConfig, StorageConfig, TmdbConfig};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
