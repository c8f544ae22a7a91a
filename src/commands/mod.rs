//! Command handlers for the pcdseq CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod completions;
pub mod config;
pub mod inspect;
pub mod list;
pub mod play;

use anyhow::Result;
use std::path::Path;

use pcdseq::{Config, PlaybackSettings};

use crate::cli::SequenceArgs;

/// Load the config from `--config` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Playback settings from the config with command line overrides applied.
pub fn sequence_settings(config: &Config, args: &SequenceArgs) -> PlaybackSettings {
    let mut settings = config.playback_settings();
    if let Some(dir) = &args.dir {
        settings.directory = dir.clone();
    }
    if let Some(pattern) = &args.pattern {
        settings.pattern = pattern.clone();
    }
    if args.no_sort {
        settings.sort = false;
    }
    settings
}

/// Truncate a string to a maximum length, adding ellipsis if needed.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.chars().take(max_len).collect()
    }
}
