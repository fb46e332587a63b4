pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, EnrichmentConfig, PlayerConfig};
pub use credentials::CredentialStore;
pub use paths::PathManager;
