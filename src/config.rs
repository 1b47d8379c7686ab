use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Sqlite,
    Postgresql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseType,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// libpq-style connection string for the target database.
    #[serde(default = "default_postgresql_url")]
    pub postgresql_url: String,

    /// Connection used by `sparkify-sever`; it must not point at the target database.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_sqlite_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkify")
        .join("sparkifydb.sqlite")
}

fn default_postgresql_url() -> String {
    "host=127.0.0.1 dbname=sparkifydb user=student password=student".to_string()
}

fn default_admin_url() -> String {
    "host=127.0.0.1 dbname=studentdb user=student password=student".to_string()
}

fn default_pool_size() -> u32 {
    1 // statements are issued strictly one after another
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseType::default(),
            sqlite_path: default_sqlite_path(),
            postgresql_url: default_postgresql_url(),
            admin_url: default_admin_url(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_song_data")]
    pub song_data: PathBuf,

    #[serde(default = "default_log_data")]
    pub log_data: PathBuf,

    /// File extension (without the dot) picked up by discovery.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_song_data() -> PathBuf {
    PathBuf::from("data/song_data")
}

fn default_log_data() -> PathBuf {
    PathBuf::from("data/log_data")
}

fn default_extension() -> String {
    "json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            song_data: default_song_data(),
            log_data: default_log_data(),
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Abort the batch on the first unreadable or malformed file.
    #[serde(default)]
    pub fail_fast: bool,

    /// Drop and recreate every table before loading.
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily-rolling log file into this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Send events to systemd-journald (Linux only).
    #[serde(default)]
    pub journald: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            journald: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            data: DataConfig::default(),
            load: LoadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from `SPARKIFY_CONFIG` or the default location, writing defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SPARKIFY_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sparkify")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
backend = "postgresql"

[load]
fail_fast = true
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.backend, DatabaseType::Postgresql);
        assert_eq!(config.database.postgresql_url, default_postgresql_url());
        assert_eq!(config.database.pool_size, 1);
        assert!(config.load.fail_fast);
        assert!(!config.load.reset);
        assert_eq!(config.data.song_data, PathBuf::from("data/song_data"));
        assert_eq!(config.data.log_data, PathBuf::from("data/log_data"));
        assert_eq!(config.data.extension, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_config_targets_local_sqlite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.backend, DatabaseType::Sqlite);
        assert!(config
            .database
            .sqlite_path
            .ends_with("sparkify/sparkifydb.sqlite"));
        assert!(config.database.postgresql_url.contains("dbname=sparkifydb"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.song_data = PathBuf::from("/srv/songs");
        config.logging.directory = Some(PathBuf::from("/var/log/sparkify"));
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.data.song_data, PathBuf::from("/srv/songs"));
        assert_eq!(
            reloaded.logging.directory,
            Some(PathBuf::from("/var/log/sparkify"))
        );
        assert_eq!(reloaded.database.backend, DatabaseType::Sqlite);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database]\nbackend = \"oracle\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
