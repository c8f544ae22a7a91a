//! pcdseq library
//!
//! Plays back a directory of PCD point cloud frames through a tick-driven,
//! controllable sequence player.

pub mod cloud;
pub mod config;
pub mod logging;
pub mod playback;
pub mod store;
pub mod viewer;

pub use cloud::{Cloud, LoadError, PcdData, PcdLoader, RecordKind, RecordLoader};
pub use config::Config;
pub use playback::{
    Command, Controls, Emission, PlaybackSettings, PublicationSink, SequencePlayer, TickOutcome,
    Trigger, TriggerPort,
};
pub use store::{Sequence, SequenceStore, StoreError};
pub use viewer::{CloudViewer, ViewerAction};
