//! Persisted connection settings.
//!
//! # Responsibility
//! - Load the settings document, creating it with a default when absent.
//! - Persist connection string changes made from the console.
//!
//! # Invariants
//! - The connection string lives at `Database.ConnectionString`.
//! - A loaded or updated connection string is never blank.
//!
//! ```toml
//! [Database]
//! ConnectionString = "employees.sqlite3"
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Settings file name used when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";
/// Placeholder written into a freshly created settings file.
pub const DEFAULT_CONNECTION_STRING: &str = "employees.sqlite3";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Serialize(toml::ser::Error),
    EmptyConnectionString {
        path: PathBuf,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot access settings file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => write!(
                f,
                "settings file `{}` is malformed: {}",
                path.display(),
                source.message()
            ),
            Self::Serialize(err) => write!(f, "cannot serialize settings: {err}"),
            Self::EmptyConnectionString { path } => write!(
                f,
                "Database.ConnectionString in `{}` is empty",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::EmptyConnectionString { .. } => None,
        }
    }
}

/// Root of the settings document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "Database")]
    pub database: DatabaseSettings,
}

/// `Database` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(rename = "ConnectionString")]
    pub connection_string: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            },
        }
    }
}

impl Settings {
    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// How [`SettingsFile::load_or_create`] obtained the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOrigin {
    Loaded,
    CreatedDefault,
}

/// Settings bound to the file they were read from.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    settings: Settings,
}

impl SettingsFile {
    /// Loads `path`, or writes default settings there when it does not exist.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read or the default cannot be written.
    /// - `Parse` when the document is malformed or lacks
    ///   `Database.ConnectionString`.
    /// - `EmptyConnectionString` when the stored value is blank.
    pub fn load_or_create(path: impl Into<PathBuf>) -> ConfigResult<(Self, SettingsOrigin)> {
        let path = path.into();

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let file = Self::create_default(path)?;
                return Ok((file, SettingsOrigin::CreatedDefault));
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let settings = match Settings::from_toml(&contents) {
            Ok(settings) => settings,
            Err(source) => {
                warn!(
                    "event=settings_load module=config status=error error_code=settings_malformed path={}",
                    path.display()
                );
                return Err(ConfigError::Parse { path, source });
            }
        };
        if settings.database.connection_string.trim().is_empty() {
            return Err(ConfigError::EmptyConnectionString { path });
        }

        info!(
            "event=settings_load module=config status=ok path={}",
            path.display()
        );
        Ok((Self { path, settings }, SettingsOrigin::Loaded))
    }

    /// Writes default settings to `path`, replacing any existing file.
    pub fn create_default(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let file = Self {
            path: path.into(),
            settings: Settings::default(),
        };
        file.save()?;
        info!(
            "event=settings_create module=config status=ok path={}",
            file.path.display()
        );
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn connection_string(&self) -> &str {
        &self.settings.database.connection_string
    }

    /// Replaces the connection string and persists the file.
    ///
    /// The value is trimmed; blank values are rejected and nothing is written.
    pub fn update_connection_string(&mut self, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::EmptyConnectionString {
                path: self.path.clone(),
            });
        }

        let previous = std::mem::replace(
            &mut self.settings.database.connection_string,
            value.to_string(),
        );
        if let Err(err) = self.save() {
            self.settings.database.connection_string = previous;
            return Err(err);
        }

        info!(
            "event=settings_update module=config status=ok path={}",
            self.path.display()
        );
        Ok(())
    }

    fn save(&self) -> ConfigResult<()> {
        let contents = self.settings.to_toml().map_err(ConfigError::Serialize)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn settings_use_database_connection_string_path() {
        let settings = Settings::from_toml(
            "[Database]\nConnectionString = \"/srv/staff/employees.db\"\n",
        )
        .unwrap();
        assert_eq!(settings.database.connection_string, "/srv/staff/employees.db");

        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("[Database]"));
        assert!(rendered.contains("ConnectionString = \"/srv/staff/employees.db\""));
    }

    #[test]
    fn missing_connection_string_is_a_parse_error() {
        let err = Settings::from_toml("[Database]\n").unwrap_err();
        assert!(err.message().contains("ConnectionString"), "{err}");
    }
}
