//! CLI error type.

use std::io;
use std::process::ExitCode;

use peakvista::config::ConfigError;
use peakvista::coord::CoordError;
use peakvista::pipeline::PipelineError;
use peakvista::provider::HttpError;
use thiserror::Error;

/// Any failure surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] HttpError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("cache unavailable at {0}")]
    CacheUnavailable(String),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_library_errors() {
        let err: CliError = PipelineError::NoViewpoint.into();
        assert!(matches!(err, CliError::Pipeline(_)));
        assert_eq!(err.to_string(), PipelineError::NoViewpoint.to_string());

        let err: CliError = ConfigError::UnknownKey("x.y".to_string()).into();
        assert!(err.to_string().contains("x.y"));
    }
}
