//! CLI definitions for pcdseq
//!
//! Kept apart from main.rs so completion generation can reach the clap tree.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use pcdseq::RecordKind;

/// Clap styles: green headers and literals, red errors.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "pcdseq")]
#[command(about = "Play back a directory of PCD point cloud frames")]
#[command(long_about = "pcdseq - play back a directory of PCD point cloud frames.

Frames are the files in a directory whose names match a regular expression,
sorted by path. Every tick the player moves through the sequence and
publishes the enabled record kinds (xyz, xyzrgb, xyzsift) of the current frame.

QUICK START:
    pcdseq list ./scans                List the frames that would be played
    pcdseq play ./scans                Play every frame once
    pcdseq play ./scans --loop         Play forever, wrapping at the end
    pcdseq play ./scans --interactive  Step through frames from stdin
    pcdseq inspect ./scans/0001.pcd    Show a frame's header

Settings are read from ~/.config/pcdseq/config.toml (see 'pcdseq config show').")]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Use this config file instead of ~/.config/pcdseq/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a sequence
    #[command(long_about = "Play a sequence of PCD frames.

By default every tick advances one frame and publishes the xyz cloud of
the new frame. Without --loop playback stops at the end of the sequence.

EXAMPLES:
    pcdseq play ./scans                     Play every frame once
    pcdseq play ./scans --loop --ticks 50   Run exactly 50 ticks, wrapping
    pcdseq play ./scans --kinds xyz,xyzrgb  Publish geometry and color
    pcdseq play ./scans --manual -i         Step with n/p from stdin
    pcdseq play ./scans --json              One JSON object per tick

INTERACTIVE COMMANDS (with --interactive):
    n    next frame
    p    previous frame
    s    publish the current frame
    r    rescan the directory
    q    quit")]
    Play(PlayArgs),

    /// List the frames of a sequence
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        sequence: SequenceArgs,
    },

    /// Show the header of a PCD file
    Inspect {
        /// Path to the .pcd file
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

/// Where to find frames. Unset values come from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SequenceArgs {
    /// Directory holding the frames
    pub dir: Option<PathBuf>,
    /// Regular expression file names must fully match
    #[arg(long)]
    pub pattern: Option<String>,
    /// Keep directory order instead of sorting by path
    #[arg(long)]
    pub no_sort: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    #[command(flatten)]
    pub sequence: SequenceArgs,

    /// Wrap around at either end
    #[arg(long = "loop")]
    pub looping: bool,

    /// Step backwards instead of forwards
    #[arg(long)]
    pub reverse: bool,

    /// Do not move automatically; only n/p move the cursor
    #[arg(long)]
    pub manual: bool,

    /// Do not publish automatically; only s publishes
    #[arg(long)]
    pub hold: bool,

    /// Record kinds to publish, comma separated (xyz, xyzrgb, xyzsift)
    #[arg(long, value_delimiter = ',')]
    pub kinds: Vec<RecordKind>,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Milliseconds between ticks (default from config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Read n/p/s/r/q commands from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Print one JSON object per tick
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
