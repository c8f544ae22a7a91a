//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};

use crate::cloud::RecordKind;
use crate::playback::DEFAULT_PATTERN;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Directory holding the frame files (supports ~/)
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Regular expression a file name must fully match
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Sort frames by path instead of directory order
    #[serde(default = "default_true")]
    pub sort: bool,
}

pub fn default_directory() -> String {
    ".".to_string()
}

pub fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

pub fn default_true() -> bool {
    true
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            pattern: default_pattern(),
            sort: true,
        }
    }
}

/// Navigation and publishing modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Wrap around at either end of the sequence
    #[serde(rename = "loop", default)]
    pub loop_sequence: bool,
    /// Publish on every tick
    #[serde(default = "default_true")]
    pub auto_publish: bool,
    /// Advance one frame on every tick
    #[serde(default = "default_true")]
    pub auto_next: bool,
    /// Step back one frame on every tick
    #[serde(default)]
    pub auto_prev: bool,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            loop_sequence: false,
            auto_publish: true,
            auto_next: true,
            auto_prev: false,
        }
    }
}

/// Which record kinds to load from each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_true")]
    pub xyz: bool,
    #[serde(default)]
    pub xyzrgb: bool,
    #[serde(default)]
    pub xyzsift: bool,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            xyz: true,
            xyzrgb: false,
            xyzsift: false,
        }
    }
}

impl CloudConfig {
    /// Enabled kinds in publication order.
    pub fn kinds(&self) -> Vec<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .filter(|kind| self.enabled(*kind))
            .collect()
    }

    pub fn enabled(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::Xyz => self.xyz,
            RecordKind::XyzRgb => self.xyzrgb,
            RecordKind::XyzSift => self.xyzsift,
        }
    }
}

/// Tick scheduling for the command line player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Milliseconds between ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

pub fn default_tick_interval() -> u64 {
    100
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

/// Display toggles for the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub coordinate_system: bool,
    #[serde(default = "default_true")]
    pub xyz: bool,
    #[serde(default = "default_true")]
    pub xyzrgb: bool,
    #[serde(default = "default_true")]
    pub xyzsift: bool,
}

pub fn default_title() -> String {
    "pcdseq".to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            coordinate_system: true,
            xyz: true,
            xyzrgb: true,
            xyzsift: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

pub fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
