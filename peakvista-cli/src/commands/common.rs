//! Common types and utilities shared across CLI commands.

use clap::Args;
use peakvista::config::ConfigFile;
use peakvista::pipeline::PipelineConfig;
use peakvista::select::{Viewpoint, DEFAULT_VIEW_DISTANCE_KM};

use crate::error::CliError;

/// Viewpoint arguments shared by `tiles` and `view`.
#[derive(Debug, Clone, Args)]
pub struct ViewpointArgs {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// View distance in kilometers
    #[arg(long, default_value_t = DEFAULT_VIEW_DISTANCE_KM)]
    pub distance_km: f64,

    /// Heading in degrees clockwise from north
    #[arg(long, allow_negative_numbers = true)]
    pub heading: Option<f64>,

    /// Sampling zoom level (overrides config)
    #[arg(long)]
    pub zoom: Option<u8>,
}

impl ViewpointArgs {
    /// Validates the arguments and builds a viewpoint.
    pub fn viewpoint(&self) -> Result<Viewpoint, CliError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CliError::InvalidArgument(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CliError::InvalidArgument(format!(
                "longitude {} is outside [-180, 180]",
                self.lon
            )));
        }
        if !self.distance_km.is_finite() || self.distance_km < 0.0 {
            return Err(CliError::InvalidArgument(format!(
                "view distance {} km must be zero or positive",
                self.distance_km
            )));
        }

        let viewpoint = Viewpoint::new(self.lat, self.lon).with_view_distance_km(self.distance_km);
        Ok(match self.heading {
            Some(heading) => viewpoint.with_heading(heading),
            None => viewpoint,
        })
    }
}

/// Loads the user's configuration, falling back to defaults when the file
/// is missing or unreadable.
pub fn load_config() -> ConfigFile {
    match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Using default configuration");
            ConfigFile::default()
        }
    }
}

/// Pipeline configuration from the config file with CLI overrides applied.
pub fn resolve_pipeline_config(
    config: &ConfigFile,
    args: &ViewpointArgs,
) -> Result<PipelineConfig, CliError> {
    let pipeline = PipelineConfig::from_config_file(config);
    match args.zoom {
        Some(zoom) if zoom > peakvista::coord::MAX_ZOOM => Err(CliError::InvalidArgument(format!(
            "zoom {} exceeds {}",
            zoom,
            peakvista::coord::MAX_ZOOM
        ))),
        Some(zoom) => Ok(pipeline.with_sampling_zoom(zoom)),
        None => Ok(pipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(lat: f64, lon: f64) -> ViewpointArgs {
        ViewpointArgs {
            lat,
            lon,
            distance_km: 10.0,
            heading: None,
            zoom: None,
        }
    }

    #[test]
    fn test_viewpoint_from_args() {
        let mut a = args(35.36, 138.73);
        a.heading = Some(-90.0);
        let vp = a.viewpoint().unwrap();
        assert_eq!(vp.heading_deg, 270.0);
        assert_eq!(vp.view_distance_km, 10.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(args(91.0, 0.0).viewpoint().is_err());
        assert!(args(0.0, 180.5).viewpoint().is_err());

        let mut a = args(0.0, 0.0);
        a.distance_km = -1.0;
        assert!(a.viewpoint().is_err());
    }

    #[test]
    fn test_zoom_override() {
        let config = ConfigFile::default();
        let mut a = args(0.0, 0.0);
        a.zoom = Some(12);
        assert_eq!(resolve_pipeline_config(&config, &a).unwrap().sampling_zoom, 12);

        a.zoom = Some(23);
        assert!(resolve_pipeline_config(&config, &a).is_err());
    }
}
