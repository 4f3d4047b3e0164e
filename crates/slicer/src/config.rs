//! Client configuration

use crate::error::{Result, SlicerError};
use slicer_transport::{ProcessConfig, StderrMode};
use std::path::PathBuf;

/// Default read size for the background reader (256 KiB)
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096 * 64;

/// Configuration for a [`Slicer`](crate::Slicer) client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How to spawn slicebot
    pub process: ProcessConfig,

    /// Upper bound on a single read from slicebot's output
    pub read_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            process: ProcessConfig::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// This will look for:
    /// - `SLICEBOT_PATH` for the slicebot executable
    /// - `SLICER_READ_CHUNK_SIZE` for the reader chunk size (bytes, > 0)
    pub fn from_env() -> Result<Self> {
        use std::env;

        let mut config = Self::default();

        if let Ok(path) = env::var("SLICEBOT_PATH")
            && !path.is_empty()
        {
            config.process.program = PathBuf::from(path);
        }

        if let Ok(size) = env::var("SLICER_READ_CHUNK_SIZE") {
            config.read_chunk_size = size.parse::<usize>().map_err(|_| {
                SlicerError::Config(format!("SLICER_READ_CHUNK_SIZE is not a number: {:?}", size))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the slicebot executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.process.program = program.into();
        self
    }

    /// Replace the whole process configuration
    pub fn with_process(mut self, process: ProcessConfig) -> Self {
        self.process = process;
        self
    }

    /// Set the reader chunk size
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Silence slicebot's stderr
    pub fn quiet(mut self) -> Self {
        self.process.stderr = StderrMode::Null;
        self
    }

    /// Check the configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(SlicerError::Config(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.process.program.as_os_str().is_empty() {
            return Err(SlicerError::Config("program path is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.process.program, PathBuf::from("slicebot"));
        assert_eq!(config.read_chunk_size, 262_144);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new()
            .with_program("/opt/jpdg/bin/slicebot")
            .with_read_chunk_size(1024)
            .quiet();
        assert_eq!(config.process.program, PathBuf::from("/opt/jpdg/bin/slicebot"));
        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.process.stderr, StderrMode::Null);
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let err = ClientConfig::new().with_read_chunk_size(0).validate().unwrap_err();
        assert!(matches!(err, SlicerError::Config(_)));
    }

    #[test]
    fn test_config_from_env_variables() {
        temp_env::with_vars(
            [
                ("SLICEBOT_PATH", Some("/usr/local/bin/slicebot")),
                ("SLICER_READ_CHUNK_SIZE", Some("8192")),
            ],
            || {
                let config = ClientConfig::from_env().expect("Should load config from environment");
                assert_eq!(
                    config.process.program,
                    PathBuf::from("/usr/local/bin/slicebot")
                );
                assert_eq!(config.read_chunk_size, 8192);
            },
        );
    }

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars_unset(["SLICEBOT_PATH", "SLICER_READ_CHUNK_SIZE"], || {
            let config = ClientConfig::from_env().unwrap();
            assert_eq!(config.process.program, PathBuf::from("slicebot"));
            assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
        });
    }

    #[test]
    fn test_config_from_env_rejects_bad_chunk_size() {
        temp_env::with_vars([("SLICER_READ_CHUNK_SIZE", Some("lots"))], || {
            assert!(matches!(
                ClientConfig::from_env(),
                Err(SlicerError::Config(_))
            ));
        });
        temp_env::with_vars([("SLICER_READ_CHUNK_SIZE", Some("0"))], || {
            assert!(matches!(
                ClientConfig::from_env(),
                Err(SlicerError::Config(_))
            ));
        });
    }
}
