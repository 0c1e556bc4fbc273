// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{default_config_path, load_config, load_config_from, ENDPOINT_ENV, SESSION_TOKEN_ENV};
pub use settings::{Config, ProviderEntry, ServerConfig};
