//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive; `configparser` lowercases them.
//! With an environment prefix set, `PREFIX_SECTION_KEY` variables override
//! values from the file.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
    env_prefix: Option<String>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self {
            config,
            env_prefix: None,
        })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self {
            config,
            env_prefix: None,
        })
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    fn env_var_name(prefix: &str, section: &str, key: &str) -> String {
        format!("{prefix}_{section}_{key}").to_uppercase()
    }

    fn env_override(&self, section: &str, key: &str) -> Option<String> {
        let prefix = self.env_prefix.as_deref()?;
        std::env::var(Self::env_var_name(prefix, section, key))
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.env_override(section, key)
            .or_else(|| self.config.get(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }
}
