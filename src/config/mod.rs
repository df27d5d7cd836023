//! Configuration module for graphweave.
//!
//! Handles the database, resolver and auth settings and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, AuthSettings, DatabaseSettings, ResolverSettings, Settings, SettingsError,
    CONFIG_ENV,
};
