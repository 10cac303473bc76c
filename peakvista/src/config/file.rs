//! INI configuration file.
//!
//! Settings live in `~/.peakvista/config.ini`. A missing file, section or key
//! means "use the default"; a present but unparsable value is an error.

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::cache::DEFAULT_MEMORY_ENTRIES;
use crate::elevation::TileFormat;
use crate::mesh::{Lod, DEFAULT_VERTICAL_EXAGGERATION};
use crate::pipeline::DEFAULT_MAX_RESIDENT_TILES;
use crate::provider::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_EXTENSION, DEFAULT_MAX_ATTEMPTS, DEFAULT_ORIGIN,
    DEFAULT_SAMPLING_ZOOM, DEFAULT_TIMEOUT_MS,
};

/// Name of the per-user configuration directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".peakvista";

pub const CONFIG_FILE_NAME: &str = "config.ini";

pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

pub const DEFAULT_DIRECTION_BATCH: usize = 15;

pub const DEFAULT_MAX_AGE_DAYS: u64 = 7;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding the config file, logs and the default cache.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// `[endpoint]`
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSettings {
    pub origin: String,
    pub extension: String,
    pub format: TileFormat,
    pub sampling_zoom: u8,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            format: TileFormat::Png,
            sampling_zoom: DEFAULT_SAMPLING_ZOOM,
        }
    }
}

/// `[fetch]`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_in_flight: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub memory_entries: usize,
    pub max_age_days: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: config_dir().join("cache"),
            memory_entries: DEFAULT_MEMORY_ENTRIES,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

/// `[view]`
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub direction_batch: usize,
    /// Fixed tile edge length; `None` derives it from latitude.
    pub tile_size_meters: Option<f32>,
    pub vertical_exaggeration: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            direction_batch: DEFAULT_DIRECTION_BATCH,
            tile_size_meters: None,
            vertical_exaggeration: DEFAULT_VERTICAL_EXAGGERATION,
        }
    }
}

/// `[device]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    pub max_resident_tiles: usize,
    pub max_lod: Lod,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            max_resident_tiles: DEFAULT_MAX_RESIDENT_TILES,
            max_lod: Lod::Fine,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub endpoint: EndpointSettings,
    pub fetch: FetchSettings,
    pub cache: CacheSettings,
    pub view: ViewSettings,
    pub device: DeviceSettings,
}

impl ConfigFile {
    /// Loads from [`config_file_path`], falling back to defaults if the file
    /// does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses an INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(str::trim)
        };

        if let Some(v) = get("endpoint", "origin") {
            config.endpoint.origin = v.to_string();
        }
        if let Some(v) = get("endpoint", "extension") {
            config.endpoint.extension = v.to_string();
        }
        if let Some(v) = get("endpoint", "format") {
            config.endpoint.format = parse_value("endpoint.format", v)?;
        }
        if let Some(v) = get("endpoint", "sampling_zoom") {
            config.endpoint.sampling_zoom = parse_value("endpoint.sampling_zoom", v)?;
        }

        if let Some(v) = get("fetch", "timeout_ms") {
            config.fetch.timeout_ms = parse_value("fetch.timeout_ms", v)?;
        }
        if let Some(v) = get("fetch", "max_attempts") {
            config.fetch.max_attempts = parse_value("fetch.max_attempts", v)?;
        }
        if let Some(v) = get("fetch", "base_delay_ms") {
            config.fetch.base_delay_ms = parse_value("fetch.base_delay_ms", v)?;
        }
        if let Some(v) = get("fetch", "max_in_flight") {
            config.fetch.max_in_flight = parse_value("fetch.max_in_flight", v)?;
        }

        if let Some(v) = get("cache", "directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = get("cache", "memory_entries") {
            config.cache.memory_entries = parse_value("cache.memory_entries", v)?;
        }
        if let Some(v) = get("cache", "max_age_days") {
            config.cache.max_age_days = parse_value("cache.max_age_days", v)?;
        }

        if let Some(v) = get("view", "direction_batch") {
            config.view.direction_batch = parse_value("view.direction_batch", v)?;
        }
        if let Some(v) = get("view", "tile_size_meters") {
            config.view.tile_size_meters = parse_optional("view.tile_size_meters", v)?;
        }
        if let Some(v) = get("view", "vertical_exaggeration") {
            config.view.vertical_exaggeration = parse_value("view.vertical_exaggeration", v)?;
        }

        if let Some(v) = get("device", "max_resident_tiles") {
            config.device.max_resident_tiles = parse_value("device.max_resident_tiles", v)?;
        }
        if let Some(v) = get("device", "max_lod") {
            config.device.max_lod = parse_lod("device.max_lod", v)?;
        }

        Ok(config)
    }

    /// Serialises every setting, including defaults.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("endpoint"))
            .set("origin", self.endpoint.origin.as_str())
            .set("extension", self.endpoint.extension.as_str())
            .set("format", self.endpoint.format.name())
            .set("sampling_zoom", self.endpoint.sampling_zoom.to_string());
        ini.with_section(Some("fetch"))
            .set("timeout_ms", self.fetch.timeout_ms.to_string())
            .set("max_attempts", self.fetch.max_attempts.to_string())
            .set("base_delay_ms", self.fetch.base_delay_ms.to_string())
            .set("max_in_flight", self.fetch.max_in_flight.to_string());
        ini.with_section(Some("cache"))
            .set("directory", self.cache.directory.display().to_string())
            .set("memory_entries", self.cache.memory_entries.to_string())
            .set("max_age_days", self.cache.max_age_days.to_string());
        ini.with_section(Some("view"))
            .set("direction_batch", self.view.direction_batch.to_string())
            .set(
                "tile_size_meters",
                self.view
                    .tile_size_meters
                    .map(|m| m.to_string())
                    .unwrap_or_default(),
            )
            .set(
                "vertical_exaggeration",
                self.view.vertical_exaggeration.to_string(),
            );
        ini.with_section(Some("device"))
            .set("max_resident_tiles", self.device.max_resident_tiles.to_string())
            .set("max_lod", self.device.max_lod.index().to_string());
        ini
    }

    /// Writes to [`config_file_path`], creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        Ok(())
    }
}

pub(crate) fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Empty means unset.
pub(crate) fn parse_optional<T>(key: &str, value: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_value(key, value).map(Some)
    }
}

/// Accepts `0`/`1`/`2` or `coarse`/`medium`/`fine`.
pub(crate) fn parse_lod(key: &str, value: &str) -> Result<Lod, ConfigError> {
    let lod = match value.trim().to_lowercase().as_str() {
        "coarse" => Some(Lod::Coarse),
        "medium" => Some(Lod::Medium),
        "fine" => Some(Lod::Fine),
        other => other.parse::<u8>().ok().and_then(Lod::from_index),
    };
    lod.ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected 0-2 or coarse/medium/fine".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert_eq!(config.view.direction_batch, 15);
        assert_eq!(config.endpoint.sampling_zoom, 14);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(
            &path,
            "[fetch]\nmax_attempts = 5\n\n[view]\ntile_size_meters = 2000\n\n[device]\nmax_lod = medium\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.view.tile_size_meters, Some(2000.0));
        assert_eq!(config.device.max_lod, Lod::Medium);
    }

    #[test]
    fn test_invalid_value_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[fetch]\ntimeout_ms = soon\n").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "fetch.timeout_ms");
                assert_eq!(value, "soon");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.endpoint.format = TileFormat::Text;
        config.endpoint.extension = "txt".to_string();
        config.cache.directory = temp.path().join("tiles");
        config.view.vertical_exaggeration = 1.5;
        config.device.max_lod = Lod::Coarse;
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_empty_tile_size_means_derived() {
        let mut ini = Ini::new();
        ini.with_section(Some("view")).set("tile_size_meters", "");
        let config = ConfigFile::from_ini(&ini).unwrap();
        assert_eq!(config.view.tile_size_meters, None);
    }

    #[test]
    fn test_parse_lod_forms() {
        assert_eq!(parse_lod("k", "0").unwrap(), Lod::Coarse);
        assert_eq!(parse_lod("k", "Fine").unwrap(), Lod::Fine);
        assert!(parse_lod("k", "3").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x"), home.join("x"));
        }
    }
}
