//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid video config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("cannot read video config: {0}")]
    Io(#[from] std::io::Error),
}

/// Resampling policy of the pixel format conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalingQuality {
    FastBilinear,
    Bilinear,
    #[default]
    Bicubic,
}

/// Knobs of one video source and its presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub scaling: ScalingQuality,
    /// Regenerate texture mip levels after every upload
    pub generate_mipmaps: bool,
    /// Surface frames still buffered in the decoder once the input runs out
    pub flush_at_end: bool,
    /// Log the container's stream table when opening
    pub dump_streams: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scaling: ScalingQuality::Bicubic,
            generate_mipmaps: true,
            flush_at_end: true,
            dump_streams: true,
        }
    }
}

impl VideoConfig {
    /// Parse a config from RON text; missing fields take their defaults.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }
}
