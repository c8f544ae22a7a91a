//! Configuration management for pcdseq

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cloud::RecordKind;
use crate::playback::PlaybackSettings;
use crate::store::compile_pattern;
use crate::viewer::ViewerSettings;

impl Config {
    /// Get the config file path (~/.config/pcdseq/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/pcdseq)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from an explicit path, or return defaults if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        io::save(self)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Expand ~ in the sequence directory path
    pub fn sequence_directory(&self) -> PathBuf {
        let dir = &self.sequence.directory;
        if let Some(stripped) = dir.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(dir)
    }

    /// Time between two player ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.playback.tick_interval_ms)
    }

    /// Log level from `[logging].level`, falling back to INFO
    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Settings for the sequence player
    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            directory: self.sequence_directory(),
            pattern: self.sequence.pattern.clone(),
            sort: self.sequence.sort,
            looping: self.mode.loop_sequence,
            auto_advance: self.mode.auto_next,
            auto_retreat: self.mode.auto_prev,
            auto_publish: self.mode.auto_publish,
            kinds: self.cloud.kinds(),
        }
    }

    /// Settings for the viewer sink
    pub fn viewer_settings(&self) -> ViewerSettings {
        let mut display = [false; 3];
        for kind in RecordKind::ALL {
            display[kind.index()] = match kind {
                RecordKind::Xyz => self.viewer.xyz,
                RecordKind::XyzRgb => self.viewer.xyzrgb,
                RecordKind::XyzSift => self.viewer.xyzsift,
            };
        }
        ViewerSettings {
            title: self.viewer.title.clone(),
            coordinate_system: self.viewer.coordinate_system,
            display,
        }
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        if let Err(e) = compile_pattern(&self.sequence.pattern) {
            return Err(format!("sequence.pattern: {}", e));
        }
        if self.playback.tick_interval_ms == 0 {
            return Err("playback.tick_interval_ms must be > 0".to_string());
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(format!(
                "Unknown logging.level '{}'. Valid: error, warn, info, debug, trace",
                self.logging.level
            ));
        }
        Ok(())
    }
}
