//! Configuration management for the journal client.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Supabase URL (can be overridden at compile time via SUPABASE_URL env var).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://troequwqpdrpgadwfgbt.supabase.co",
};

/// Default Supabase publishable key (overridable at compile time via
/// SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "sb_publishable_XDbKzADmUoR1NnEPIRl57w_iB7r088Q",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of records fetched per list call.
pub const DEFAULT_LIST_LIMIT: usize = 200;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_publishable_key: DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults.
    ///
    /// `supabase_url` and `supabase_publishable_key` are compile-time only
    /// and always use the built-in defaults regardless of the config file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from config file)
        config.supabase_url = DEFAULT_SUPABASE_URL.to_string();
        config.supabase_publishable_key = DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string();

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    ///
    /// Only `log_level` can be overridden at runtime (WIRED_LOG_LEVEL).
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("WIRED_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }
}
