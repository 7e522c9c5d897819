//! Application configuration module.
//!
//! Manages the TOML config file holding the OMDB API key, connection
//! settings, and the default listing shown by the viewer.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{API_KEY_ENV, AppConfig, BrowseConfig, OmdbConfig};
pub use paths::resolve_config_path;
