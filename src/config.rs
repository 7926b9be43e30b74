//! Configuration file parser and on-disk locations.
//!
//! Everything lives in one directory: `$BROADSHEET_HOME`, or
//! `~/.config/broadsheet` when unset. The config file inside it is optional,
//! a missing file yields `Config::default()`.

use crate::source::sections::DEFAULT_SECTION;
use crate::source::{HttpSourceOptions, DEFAULT_FEED_BASE, DEFAULT_READER_BASE};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config directory.
pub const HOME_ENV: &str = "BROADSHEET_HOME";
/// Takes precedence over `api_key` in the config file.
pub const API_KEY_ENV: &str = "BROADSHEET_API_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config too large: {0}")]
    TooLarge(String),

    #[error("cannot locate a config directory: set {HOME_ENV} or HOME")]
    NoHome,
}

// ============================================================================
// Paths
// ============================================================================

/// Files and directories under the config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the directory from `BROADSHEET_HOME`, then `HOME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var_os(key).map(PathBuf::from))
    }

    fn resolve(env: impl Fn(&str) -> Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(dir) = env(HOME_ENV).filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Self::new(dir));
        }
        let home = env("HOME")
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::NoHome)?;
        Ok(Self::new(home.join(".config").join("broadsheet")))
    }

    /// Creates the directory, owner-only on Unix.
    pub fn ensure(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.root)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.root, std::fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn socket(&self) -> PathBuf {
        self.root.join("serve.sock")
    }

    pub fn serve_log(&self) -> PathBuf {
        self.root.join("serve.log")
    }

    pub fn ui_log(&self) -> PathBuf {
        self.root.join("broadsheet.log")
    }

    /// Where debug-mode page dumps are written.
    pub fn debug_dir(&self) -> PathBuf {
        self.root.join("debug")
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Settings from `config.toml`. Every key is optional.
///
/// `Debug` never prints the API key.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `auto`, `dark` or `light`.
    pub theme: String,

    /// Section opened when none is given on the command line.
    pub default_section: String,

    /// Start articles in multi-column layout.
    pub two_column: bool,

    /// Base URL for section RSS feeds.
    pub feed_base_url: String,

    /// Reader proxy that turns article pages into markdown.
    pub reader_base_url: String,

    /// Credential for authenticated reads. `BROADSHEET_API_KEY` wins.
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "auto".to_string(),
            default_section: DEFAULT_SECTION.to_string(),
            two_column: false,
            feed_base_url: DEFAULT_FEED_BASE.to_string(),
            reader_base_url: DEFAULT_READER_BASE.to_string(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("theme", &self.theme)
            .field("default_section", &self.default_section)
            .field("two_column", &self.two_column)
            .field("feed_base_url", &self.feed_base_url)
            .field("reader_base_url", &self.reader_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

const KNOWN_KEYS: &[&str] = &[
    "theme",
    "default_section",
    "two_column",
    "feed_base_url",
    "reader_base_url",
    "api_key",
];

impl Config {
    /// Larger files are rejected unread.
    const MAX_FILE_SIZE: u64 = 1024 * 1024;

    /// Reads `path`, falling back to defaults when it is missing or blank.
    /// Unknown keys are logged and ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(text) = read_bounded(path, Self::MAX_FILE_SIZE)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let table: toml::Table = text.parse()?;
        table
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Ignoring unknown config key"));

        let config: Config = toml::Value::Table(table).try_into()?;
        tracing::debug!(path = %path.display(), ?config, "Config loaded");
        Ok(config)
    }

    /// The API key from the environment, else from the file. Blank counts as unset.
    pub fn resolved_api_key(&self) -> Option<SecretString> {
        self.api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with(&self, env_value: Option<String>) -> Option<SecretString> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .map(|k| SecretString::from(k.trim().to_string()))
    }

    /// Options for the live HTTP source.
    pub fn source_options(&self) -> HttpSourceOptions {
        HttpSourceOptions {
            feed_base_url: Some(self.feed_base_url.clone()),
            reader_base_url: Some(self.reader_base_url.clone()),
            api_key: self.resolved_api_key(),
        }
    }
}

/// Whole file as text, `None` if it does not exist.
fn read_bounded(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    use std::io::Read;

    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    file.take(limit + 1).read_to_string(&mut text)?;
    if text.len() as u64 > limit {
        return Err(ConfigError::TooLarge(format!(
            "{} exceeds {limit} bytes",
            path.display()
        )));
    }
    Ok(Some(text))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let defaults = Config::default();
        assert_eq!(defaults.theme, "auto");
        assert_eq!(defaults.default_section, "leaders");
        assert!(!defaults.two_column);
        assert_eq!(defaults.feed_base_url, DEFAULT_FEED_BASE);
        assert!(defaults.api_key.is_none());
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.default_section, "leaders");
    }

    #[test]
    fn test_blank_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(Config::load(&path).unwrap().theme, "auto");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = \"light\"\ntwo_column = true\nmystery = 1\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.theme, "light");
        assert!(loaded.two_column);
        assert_eq!(loaded.reader_base_url, DEFAULT_READER_BASE);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [unclosed").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let padding = "#".repeat(Config::MAX_FILE_SIZE as usize + 1);
        std::fs::write(&path, padding).unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::TooLarge(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config {
            api_key: Some("super-secret".into()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_env_api_key_wins() {
        let config = Config {
            api_key: Some("from-file".into()),
            ..Config::default()
        };
        let key = config.api_key_with(Some("from-env".into())).unwrap();
        assert_eq!(key.expose_secret(), "from-env");
        let key = config.api_key_with(Some("   ".into())).unwrap();
        assert_eq!(key.expose_secret(), "from-file");
        assert!(Config::default().api_key_with(None).is_none());
    }

    #[test]
    fn test_paths_resolution() {
        let paths = Paths::resolve(|key| match key {
            "HOME" => Some(PathBuf::from("/home/reader")),
            _ => None,
        })
        .unwrap();
        assert_eq!(paths.root, PathBuf::from("/home/reader/.config/broadsheet"));
        assert_eq!(paths.socket(), PathBuf::from("/home/reader/.config/broadsheet/serve.sock"));

        let paths = Paths::resolve(|key| match key {
            HOME_ENV => Some(PathBuf::from("/tmp/bs")),
            _ => Some(PathBuf::from("/ignored")),
        })
        .unwrap();
        assert_eq!(paths.cache_dir(), PathBuf::from("/tmp/bs/cache"));

        assert!(matches!(Paths::resolve(|_| None), Err(ConfigError::NoHome)));
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path().join("home"));
        paths.ensure().unwrap();
        let mode = std::fs::metadata(&paths.root).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
