use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HdrError;

/// Alignment parameters for one merge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdrConfig {
    /// Side of the square patch used for alignment, in pixels.
    pub block_size: usize,
    /// Maximum translation searched in each direction, in pixels.
    pub max_offset: usize,
}

impl Default for HdrConfig {
    fn default() -> Self {
        Self {
            block_size: 100,
            max_offset: 50,
        }
    }
}

impl HdrConfig {
    pub fn validate(&self) -> Result<(), HdrError> {
        if self.block_size == 0 {
            return Err(HdrError::InvalidConfig("block_size must be positive"));
        }

        Ok(())
    }

    /// Patch side actually used for an image: the configured size, shrunk to
    /// fit the shorter image side.
    #[inline]
    pub fn effective_block_size(&self, width: usize, height: usize) -> usize {
        self.block_size.min(width).min(height)
    }

    /// Reads a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: HdrConfig = serde_json::from_str(&text)?;
        config.validate()?;

        Ok(config)
    }
}
