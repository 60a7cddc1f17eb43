//! Tunable limits and quality settings for the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scale::FilterType;

/// Size of the read-ahead buffer placed in front of the memory stream.
pub const DEFAULT_IO_BUFFER_SIZE: usize = 32 * 1024;

/// Errors reported by [`PipelineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("I/O buffer size must be non-zero")]
    ZeroBufferSize,

    #[error("Quantizer range {qmin}..={qmax} is invalid (expected 1 <= qmin <= qmax <= 31)")]
    InvalidQuantizerRange { qmin: u32, qmax: u32 },
}

/// Pipeline configuration shared by decode, render and thumbnail encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Read-ahead buffer in front of the memory stream (bytes).
    pub io_buffer_size: usize,
    /// Upper bound on `width * height` of a decoded image.
    pub max_decoded_pixels: u64,
    /// Upper bound on any single decoder allocation (bytes).
    pub max_decoded_bytes: u64,
    /// Resampling filter used when rendering to a smaller surface.
    pub scale_filter: FilterType,
    /// Minimum quantizer for thumbnail encoding; drives constant quality.
    pub thumbnail_qmin: u32,
    /// Maximum quantizer for thumbnail encoding.
    pub thumbnail_qmax: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            max_decoded_pixels: 64_000_000,
            max_decoded_bytes: 512 * 1024 * 1024,
            scale_filter: FilterType::Bicubic,
            thumbnail_qmin: 2,
            thumbnail_qmax: 31,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }

        let (qmin, qmax) = (self.thumbnail_qmin, self.thumbnail_qmax);
        if qmin == 0 || qmin > qmax || qmax > 31 {
            return Err(ConfigError::InvalidQuantizerRange { qmin, qmax });
        }

        Ok(())
    }

    /// Largest width or height the decoder will accept.
    ///
    /// A square image is the worst case for a pixel budget, so each side is
    /// bounded by the budget itself and the total is checked after decode.
    pub(crate) fn max_side(&self) -> u32 {
        self.max_decoded_pixels.min(u32::MAX as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.io_buffer_size, DEFAULT_IO_BUFFER_SIZE);
        assert_eq!(config.scale_filter, FilterType::Bicubic);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let mut config = PipelineConfig::default();
        config.io_buffer_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBufferSize));
    }

    #[test]
    fn test_quantizer_range_rejected() {
        let mut config = PipelineConfig::default();
        config.thumbnail_qmin = 10;
        config.thumbnail_qmax = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuantizerRange { qmin: 10, qmax: 5 })
        ));

        config.thumbnail_qmin = 0;
        config.thumbnail_qmax = 31;
        assert!(config.validate().is_err());

        config.thumbnail_qmin = 1;
        config.thumbnail_qmax = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidQuantizerRange { qmin: 4, qmax: 2 };
        assert_eq!(
            err.to_string(),
            "Quantizer range 4..=2 is invalid (expected 1 <= qmin <= qmax <= 31)"
        );
    }
}
