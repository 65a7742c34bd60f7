use std::path::PathBuf;

use reposync_core::upload::{default_allowed_extensions, DEFAULT_MAX_FILE_SIZE};

/// Default blob directory, relative to the working directory.
pub const DEFAULT_STORAGE_PATH: &str = "storage/files";

/// Default SQLite database, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://storage/reposync.db";

/// A configuration variable held a value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Vault configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// SQLite connection string for collections, documents and versions.
    pub database_url: String,
    /// Root directory for version content.
    pub storage_path: PathBuf,
    /// Upload limit in bytes.
    pub max_file_size: u64,
    /// Lower-case extensions accepted for upload.
    pub allowed_extensions: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default                        |
    /// |----------------------|--------------------------------|
    /// | `DATABASE_URL`       | `sqlite://storage/reposync.db` |
    /// | `STORAGE_PATH`       | `storage/files`                |
    /// | `MAX_FILE_SIZE`      | `104857600`                    |
    /// | `ALLOWED_EXTENSIONS` | `xlsx,xlsm,xls`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.database_url);

        let storage_path = lookup("STORAGE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let max_file_size = match lookup("MAX_FILE_SIZE") {
            None => defaults.max_file_size,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MAX_FILE_SIZE",
                        expected: "a positive number of bytes",
                        value: raw,
                    })
                }
            },
        };

        let allowed_extensions = match lookup("ALLOWED_EXTENSIONS") {
            None => defaults.allowed_extensions,
            Some(raw) => {
                let list: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if list.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: "ALLOWED_EXTENSIONS",
                        expected: "a comma-separated list of extensions",
                        value: raw,
                    });
                }
                list
            }
        };

        Ok(Self {
            database_url,
            storage_path,
            max_file_size,
            allowed_extensions,
        })
    }
}
