//! Configuration for BlockKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for a BlockKV store
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding every store file. Must already exist.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── index.info       (key index)
    ///     ├── FreeBlocks.info  (free-block index)
    ///     └── data_<N>         (fixed-capacity data files)
    pub data_dir: PathBuf,

    /// Capacity of a single data file (in bytes)
    pub max_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./blockkv_data"),
            max_file_size: 1024 * 1024, // 1 MiB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the construction contract: an existing directory and a
    /// positive file capacity.
    pub fn validate(&self) -> Result<()> {
        if !self.data_dir.exists() {
            return Err(StoreError::Config(format!(
                "working directory {} does not exist",
                self.data_dir.display()
            )));
        }
        if !self.data_dir.is_dir() {
            return Err(StoreError::Config(format!(
                "{} is not a directory",
                self.data_dir.display()
            )));
        }
        if self.max_file_size == 0 {
            return Err(StoreError::Config(
                "max_file_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the working directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the data file capacity (in bytes)
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.max_file_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
