/// TOML configuration loading, validation and live access.
pub mod toml_config;
