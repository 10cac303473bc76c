//! User configuration
//!
//! [`ConfigFile`] reads and writes `~/.peakvista/config.ini`; [`ConfigKey`]
//! addresses individual settings for `config get/set/list`. The pipeline
//! builds its runtime configuration from a loaded file with
//! [`PipelineConfig::from_config_file`](crate::pipeline::PipelineConfig::from_config_file).

mod file;
mod keys;

pub use file::{
    config_dir, config_file_path, expand_tilde, CacheSettings, ConfigError, ConfigFile,
    DeviceSettings, EndpointSettings, FetchSettings, ViewSettings, CONFIG_DIR_NAME,
    CONFIG_FILE_NAME, DEFAULT_DIRECTION_BATCH, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_IN_FLIGHT,
};
pub use keys::ConfigKey;

/// Formats a byte count with binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }
}
