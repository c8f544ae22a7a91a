//! Log output setup
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go. Logs are written to stderr so stdout stays clean for player output.

use tracing::Level;

/// Levels from least to most verbose.
const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// Apply `-v`/`-q` command line flags on top of the configured level.
///
/// Each `-v` moves one step towards TRACE; `-q` forces ERROR.
pub fn adjust_level(base: Level, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    let pos = LEVELS.iter().position(|l| *l == base).unwrap_or(2);
    LEVELS[(pos + verbose as usize).min(LEVELS.len() - 1)]
}

/// Install the global fmt subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
