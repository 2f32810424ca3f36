//! Naming and fallback configuration.
//!
//! Settings are read from `~/.stegbits/config.toml` when it exists, or from a
//! file given explicitly. Missing keys take their defaults.
//!
//! ```toml
//! output_suffix = "_stego"
//! recovered_suffix = "_recovered"
//! image_fallback_extension = ".bin"
//! video_fallback_name = "recovered_file.bin"
//! recovery_dir = "recovered"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default suffix appended to the carrier stem for hide output.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_stego";

/// Default suffix appended to the carrier stem for recovered image payloads.
pub const DEFAULT_RECOVERED_SUFFIX: &str = "_recovered";

/// Extension used when a recovered image payload has none or it is undecodable.
pub const DEFAULT_FALLBACK_EXTENSION: &str = ".bin";

/// Name used when a recovered video payload name is unusable.
pub const DEFAULT_FALLBACK_NAME: &str = "recovered_file.bin";

/// Directory recovered video payloads are written to by default.
pub const DEFAULT_RECOVERY_DIR: &str = "recovered";

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error in {}: {source}", path.display())]
    TomlParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Output naming settings shared by both pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StegoConfig {
    /// Suffix for the default hide output of either pipeline, e.g.
    /// `cat.jpg` -> `cat_stego.png` or `clip.y4m` -> `clip_stego.y4m`.
    pub output_suffix: String,

    /// Suffix for recovered image payloads, e.g. `cat_stego_recovered.zip`.
    pub recovered_suffix: String,

    /// Extension used when the recovered extension is missing or undecodable.
    pub image_fallback_extension: String,

    /// File name used when the recovered video payload name is unusable.
    pub video_fallback_name: String,

    /// Default output directory for recovered video payloads.
    pub recovery_dir: PathBuf,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            recovered_suffix: DEFAULT_RECOVERED_SUFFIX.to_string(),
            image_fallback_extension: DEFAULT_FALLBACK_EXTENSION.to_string(),
            video_fallback_name: DEFAULT_FALLBACK_NAME.to_string(),
            recovery_dir: PathBuf::from(DEFAULT_RECOVERY_DIR),
        }
    }
}

impl StegoConfig {
    /// Loads the configuration from `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, else the default location, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// `~/.stegbits/config.toml`, if a home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".stegbits").join("config.toml"))
    }
}
