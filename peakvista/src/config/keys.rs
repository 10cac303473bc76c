//! Addressable `section.key` settings for the CLI.

use std::str::FromStr;

use super::file::{
    expand_tilde, parse_lod, parse_optional, parse_value, ConfigError, ConfigFile,
};

/// One setting in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    EndpointOrigin,
    EndpointExtension,
    EndpointFormat,
    EndpointSamplingZoom,
    FetchTimeoutMs,
    FetchMaxAttempts,
    FetchBaseDelayMs,
    FetchMaxInFlight,
    CacheDirectory,
    CacheMemoryEntries,
    CacheMaxAgeDays,
    ViewDirectionBatch,
    ViewTileSizeMeters,
    ViewVerticalExaggeration,
    DeviceMaxResidentTiles,
    DeviceMaxLod,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::EndpointOrigin,
            ConfigKey::EndpointExtension,
            ConfigKey::EndpointFormat,
            ConfigKey::EndpointSamplingZoom,
            ConfigKey::FetchTimeoutMs,
            ConfigKey::FetchMaxAttempts,
            ConfigKey::FetchBaseDelayMs,
            ConfigKey::FetchMaxInFlight,
            ConfigKey::CacheDirectory,
            ConfigKey::CacheMemoryEntries,
            ConfigKey::CacheMaxAgeDays,
            ConfigKey::ViewDirectionBatch,
            ConfigKey::ViewTileSizeMeters,
            ConfigKey::ViewVerticalExaggeration,
            ConfigKey::DeviceMaxResidentTiles,
            ConfigKey::DeviceMaxLod,
        ]
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::EndpointOrigin => "endpoint.origin",
            ConfigKey::EndpointExtension => "endpoint.extension",
            ConfigKey::EndpointFormat => "endpoint.format",
            ConfigKey::EndpointSamplingZoom => "endpoint.sampling_zoom",
            ConfigKey::FetchTimeoutMs => "fetch.timeout_ms",
            ConfigKey::FetchMaxAttempts => "fetch.max_attempts",
            ConfigKey::FetchBaseDelayMs => "fetch.base_delay_ms",
            ConfigKey::FetchMaxInFlight => "fetch.max_in_flight",
            ConfigKey::CacheDirectory => "cache.directory",
            ConfigKey::CacheMemoryEntries => "cache.memory_entries",
            ConfigKey::CacheMaxAgeDays => "cache.max_age_days",
            ConfigKey::ViewDirectionBatch => "view.direction_batch",
            ConfigKey::ViewTileSizeMeters => "view.tile_size_meters",
            ConfigKey::ViewVerticalExaggeration => "view.vertical_exaggeration",
            ConfigKey::DeviceMaxResidentTiles => "device.max_resident_tiles",
            ConfigKey::DeviceMaxLod => "device.max_lod",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or((name, ""))
    }

    /// Current value as it would be written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::EndpointOrigin => config.endpoint.origin.clone(),
            ConfigKey::EndpointExtension => config.endpoint.extension.clone(),
            ConfigKey::EndpointFormat => config.endpoint.format.to_string(),
            ConfigKey::EndpointSamplingZoom => config.endpoint.sampling_zoom.to_string(),
            ConfigKey::FetchTimeoutMs => config.fetch.timeout_ms.to_string(),
            ConfigKey::FetchMaxAttempts => config.fetch.max_attempts.to_string(),
            ConfigKey::FetchBaseDelayMs => config.fetch.base_delay_ms.to_string(),
            ConfigKey::FetchMaxInFlight => config.fetch.max_in_flight.to_string(),
            ConfigKey::CacheDirectory => config.cache.directory.display().to_string(),
            ConfigKey::CacheMemoryEntries => config.cache.memory_entries.to_string(),
            ConfigKey::CacheMaxAgeDays => config.cache.max_age_days.to_string(),
            ConfigKey::ViewDirectionBatch => config.view.direction_batch.to_string(),
            ConfigKey::ViewTileSizeMeters => config
                .view
                .tile_size_meters
                .map(|m| m.to_string())
                .unwrap_or_default(),
            ConfigKey::ViewVerticalExaggeration => config.view.vertical_exaggeration.to_string(),
            ConfigKey::DeviceMaxResidentTiles => config.device.max_resident_tiles.to_string(),
            ConfigKey::DeviceMaxLod => config.device.max_lod.index().to_string(),
        }
    }

    /// Parses and assigns `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let key = self.name();
        match self {
            ConfigKey::EndpointOrigin => config.endpoint.origin = value.trim().to_string(),
            ConfigKey::EndpointExtension => config.endpoint.extension = value.trim().to_string(),
            ConfigKey::EndpointFormat => config.endpoint.format = parse_value(key, value)?,
            ConfigKey::EndpointSamplingZoom => {
                let zoom: u8 = parse_value(key, value)?;
                if zoom > crate::coord::MAX_ZOOM {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: format!("zoom must be at most {}", crate::coord::MAX_ZOOM),
                    });
                }
                config.endpoint.sampling_zoom = zoom;
            }
            ConfigKey::FetchTimeoutMs => config.fetch.timeout_ms = parse_value(key, value)?,
            ConfigKey::FetchMaxAttempts => config.fetch.max_attempts = parse_value(key, value)?,
            ConfigKey::FetchBaseDelayMs => config.fetch.base_delay_ms = parse_value(key, value)?,
            ConfigKey::FetchMaxInFlight => config.fetch.max_in_flight = parse_value(key, value)?,
            ConfigKey::CacheDirectory => config.cache.directory = expand_tilde(value.trim()),
            ConfigKey::CacheMemoryEntries => {
                config.cache.memory_entries = parse_value(key, value)?
            }
            ConfigKey::CacheMaxAgeDays => config.cache.max_age_days = parse_value(key, value)?,
            ConfigKey::ViewDirectionBatch => {
                config.view.direction_batch = parse_value(key, value)?
            }
            ConfigKey::ViewTileSizeMeters => {
                config.view.tile_size_meters = parse_optional(key, value)?
            }
            ConfigKey::ViewVerticalExaggeration => {
                config.view.vertical_exaggeration = parse_value(key, value)?
            }
            ConfigKey::DeviceMaxResidentTiles => {
                config.device.max_resident_tiles = parse_value(key, value)?
            }
            ConfigKey::DeviceMaxLod => config.device.max_lod = parse_lod(key, value)?,
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
