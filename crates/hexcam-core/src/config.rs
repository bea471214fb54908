//! Frame configuration.
//!
//! Dimensions, group layout, color model and the overflow/decode policies are
//! explicit configuration rather than constants. A configuration can be
//! loaded from JSON; every field is optional and falls back to the camera's
//! native 96x96 packed-nibble output rendered as grayscale.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Native sensor output width in pixels.
pub const DEFAULT_WIDTH: u32 = 96;
/// Native sensor output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 96;
/// Largest accepted frame width or height.
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("frame {dimension} must be greater than zero")]
    ZeroDimension { dimension: &'static str },
    #[error("frame {dimension} {value} exceeds the maximum of {max}")]
    TooLarge {
        dimension: &'static str,
        value: u32,
        max: u32,
    },
}

/// Byte grouping of the pixel stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupLayout {
    /// `(Y, UV)`: one pixel per 2 bytes, U and V packed as nibbles.
    #[default]
    PackedNibble,
    /// `(Y0, U, Y1, V)`: two pixels per 4 bytes sharing full-byte chroma.
    Yuyv,
}

impl GroupLayout {
    /// Bytes consumed per group.
    pub fn group_len(self) -> usize {
        match self {
            GroupLayout::PackedNibble => 2,
            GroupLayout::Yuyv => 4,
        }
    }
}

/// Color conversion applied to each sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModel {
    /// Grayscale from luminance; chroma is ignored.
    #[default]
    LumaOnly,
    /// Full YUV to RGB conversion.
    FullYuv,
}

/// What happens when pixels arrive after the last row of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Drop pixels past the last row until the next frame starts.
    #[default]
    Truncate,
    /// Close the frame and continue at the top of a new one.
    #[serde(rename = "wrap")]
    WrapNewFrame,
    /// Fail the conversion.
    Error,
}

/// Handling of malformed hex tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Skip malformed tokens and keep decoding.
    #[default]
    Lenient,
    /// Abort on the first malformed token.
    Strict,
}

/// Complete description of how a byte stream maps onto a frame.
///
/// # Examples
/// ```
/// use hexcam_core::{FrameConfig, GroupLayout};
///
/// let config: FrameConfig = serde_json::from_str(r#"{"width": 4, "layout": "yuyv"}"#)?;
/// assert_eq!(config.width, 4);
/// assert_eq!(config.height, 96);
/// assert_eq!(config.layout, GroupLayout::Yuyv);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub layout: GroupLayout,
    pub color_model: ColorModel,
    pub overflow: OverflowPolicy,
    pub decode_policy: DecodePolicy,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            layout: GroupLayout::default(),
            color_model: ColorModel::default(),
            overflow: OverflowPolicy::default(),
            decode_policy: DecodePolicy::default(),
        }
    }
}

impl FrameConfig {
    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError` when the file cannot be read, is not valid JSON
    /// for this schema, or describes an empty frame.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_over(path, FrameConfig::default())
    }

    /// Load a JSON configuration whose missing fields come from `base`
    /// instead of the built-in defaults.
    ///
    /// # Examples
    /// ```no_run
    /// use std::path::Path;
    ///
    /// use hexcam_core::{ColorModel, FrameConfig};
    ///
    /// let base = FrameConfig {
    ///     color_model: ColorModel::FullYuv,
    ///     ..FrameConfig::default()
    /// };
    /// let config = FrameConfig::load_over(Path::new("frame.json"), base)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_over(path: &Path, base: FrameConfig) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_over(&text, base)?;
        config.validate()?;
        Ok(config)
    }

    fn from_json_over(text: &str, base: FrameConfig) -> Result<Self, ConfigError> {
        let overrides: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
        let mut merged = match serde_json::to_value(base)? {
            serde_json::Value::Object(fields) => fields,
            _ => serde_json::Map::new(),
        };
        merged.extend(overrides);
        Ok(serde_json::from_value(serde_json::Value::Object(merged))?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (dimension, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { dimension });
            }
            if value > MAX_DIMENSION {
                return Err(ConfigError::TooLarge {
                    dimension,
                    value,
                    max: MAX_DIMENSION,
                });
            }
        }
        Ok(())
    }

    /// Number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(ConfigError::UnknownVariant {
                        kind: $kind,
                        value: value.to_string(),
                        expected: concat!($($text, " "),+).trim_ascii_end(),
                    }),
                }
            }
        }
    };
}

text_enum!(GroupLayout, "group layout", {
    PackedNibble => "packed-nibble",
    Yuyv => "yuyv",
});
text_enum!(ColorModel, "color model", {
    LumaOnly => "luma-only",
    FullYuv => "full-yuv",
});
text_enum!(OverflowPolicy, "overflow policy", {
    Truncate => "truncate",
    WrapNewFrame => "wrap",
    Error => "error",
});
text_enum!(DecodePolicy, "decode policy", {
    Lenient => "lenient",
    Strict => "strict",
});
