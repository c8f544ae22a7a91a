//! Play command handler

use anyhow::Result;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use pcdseq::playback::{Boundary, Command, Controls, Trigger, TriggerPort};
use pcdseq::{
    CloudViewer, Config, PlaybackSettings, RecordLoader, SequencePlayer, TickOutcome, ViewerAction,
};

use super::{sequence_settings, truncate_string};
use crate::cli::PlayArgs;

/// A line typed in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Trigger(Trigger),
    Command(Command),
    Quit,
}

/// Parse one interactive command. Blank or unknown lines yield `None`.
pub fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(Input::Trigger(Trigger::Advance)),
        "p" | "prev" => Some(Input::Trigger(Trigger::Retreat)),
        "s" | "show" | "publish" => Some(Input::Trigger(Trigger::Publish)),
        "r" | "reload" => Some(Input::Command(Command::Reload)),
        "q" | "quit" => Some(Input::Quit),
        _ => None,
    }
}

/// Playback settings for `play`: config, then sequence args, then mode flags.
pub fn play_settings(config: &Config, args: &PlayArgs) -> PlaybackSettings {
    let mut settings = sequence_settings(config, &args.sequence);
    if args.looping {
        settings.looping = true;
    }
    if args.reverse {
        settings.auto_advance = false;
        settings.auto_retreat = true;
    }
    if args.manual {
        settings.auto_advance = false;
        settings.auto_retreat = false;
    }
    if args.hold {
        settings.auto_publish = false;
    }
    if !args.kinds.is_empty() {
        settings.kinds = args.kinds.clone();
    }
    settings
}

/// Whether an unattended run has nothing more to show after `outcome`.
///
/// Interactive runs and runs with a tick limit never stop on their own.
pub fn finished(args: &PlayArgs, settings: &PlaybackSettings, outcome: &TickOutcome) -> bool {
    if args.interactive || args.ticks.is_some() {
        return false;
    }
    match outcome {
        TickOutcome::Ended { .. } | TickOutcome::Empty | TickOutcome::Held { .. } => true,
        // The cursor cannot move, so every further tick repeats this one.
        _ => settings.auto_advance == settings.auto_retreat,
    }
}

/// Play a sequence until it ends, the tick limit is hit, or the user quits.
#[cfg(not(tarpaulin_include))]
pub fn handle(config: &Config, args: &PlayArgs) -> Result<()> {
    let settings = play_settings(config, args);
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.tick_interval());

    let mut player = SequencePlayer::with_pcd_loader(settings.clone());
    let mut viewer = CloudViewer::new(config.viewer_settings());

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .ok(); // Ignore if handler already set

    if args.interactive {
        spawn_input_reader(
            player.controls(),
            player.trigger_port(),
            Arc::clone(&running),
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !args.json {
        writeln!(out, "{}", viewer.title())?;
    }

    let mut tick: u64 = 0;
    while running.load(Ordering::SeqCst) {
        if args.ticks.is_some_and(|max| tick >= max) {
            break;
        }
        if tick > 0 {
            thread::sleep(interval);
        }
        tick += 1;

        let ends_before = viewer.ends_seen();
        let outcome = player.tick(&mut viewer);
        let signalled = viewer.ends_seen() > ends_before;
        let actions = viewer.refresh();

        if args.json {
            let line = tick_json(tick, &player, &outcome, signalled, &actions);
            writeln!(out, "{}", line)?;
        } else {
            write_tick(&mut out, tick, &player, &outcome, signalled, &actions)?;
        }
        out.flush()?;

        if finished(args, &settings, &outcome) {
            break;
        }
    }

    debug!(ticks = tick, "Playback stopped");
    Ok(())
}

/// Forward stdin commands to the player until EOF or `q`.
#[cfg(not(tarpaulin_include))]
fn spawn_input_reader(controls: Controls, port: TriggerPort, running: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(Input::Trigger(trigger)) => {
                    if !port.fire(trigger) {
                        debug!(?trigger, "Trigger dropped");
                    }
                }
                Some(Input::Command(command)) => controls.apply(command),
                Some(Input::Quit) => break,
                None if line.trim().is_empty() => {}
                None => eprintln!("Unknown command '{}' (n, p, s, r, q)", line.trim()),
            }
        }
        running.store(false, Ordering::SeqCst);
    });
}

fn frame_label<L: RecordLoader>(player: &SequencePlayer<L>, index: usize) -> String {
    let name = player
        .sequence()
        .get(index)
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "frame {}/{} {}",
        index + 1,
        player.sequence().len(),
        truncate_string(&name, 48)
    )
}

fn boundary_name(boundary: Boundary) -> &'static str {
    match boundary {
        Boundary::Start => "start",
        Boundary::End => "end",
    }
}

/// Human readable form of a viewer action.
pub fn describe(action: &ViewerAction) -> String {
    match action {
        ViewerAction::ShowCloud { kind, record } => {
            format!("show {} cloud ({} points)", kind, record.len())
        }
        ViewerAction::UpdateCloud { kind, record } => {
            format!("update {} cloud ({} points)", kind, record.len())
        }
        ViewerAction::HideCloud { kind } => format!("hide {} cloud", kind),
        ViewerAction::ShowCoordinateSystem => "show coordinate system".to_string(),
        ViewerAction::HideCoordinateSystem => "hide coordinate system".to_string(),
    }
}

fn write_tick<W: Write, L: RecordLoader>(
    out: &mut W,
    tick: u64,
    player: &SequencePlayer<L>,
    outcome: &TickOutcome,
    signalled: bool,
    actions: &[ViewerAction],
) -> io::Result<()> {
    if signalled && !matches!(outcome, TickOutcome::Ended { .. }) {
        writeln!(out, "[{}] end of sequence, looping", tick)?;
    }

    match *outcome {
        TickOutcome::Loaded {
            index,
            published,
            failed,
        } => {
            write!(
                out,
                "[{}] {}: loaded {} record(s)",
                tick,
                frame_label(player, index),
                published
            )?;
            if failed > 0 {
                write!(out, ", {} failed", failed)?;
            }
            writeln!(out)?;
        }
        TickOutcome::Cached { index, published } => writeln!(
            out,
            "[{}] {}: republished {} record(s)",
            tick,
            frame_label(player, index),
            published
        )?,
        TickOutcome::Ended { index, boundary } => writeln!(
            out,
            "[{}] end of sequence ({}, {})",
            tick,
            boundary_name(boundary),
            frame_label(player, index)
        )?,
        TickOutcome::Empty => match player.last_error() {
            Some(err) => writeln!(out, "[{}] no frames: {}", tick, err)?,
            None => writeln!(
                out,
                "[{}] no frames matching {} in {}",
                tick,
                player.settings().pattern,
                player.settings().directory.display()
            )?,
        },
        TickOutcome::Held { index } => {
            writeln!(out, "[{}] {}: held", tick, frame_label(player, index))?
        }
    }

    for action in actions {
        writeln!(out, "    {}", describe(action))?;
    }
    Ok(())
}

fn tick_json<L: RecordLoader>(
    tick: u64,
    player: &SequencePlayer<L>,
    outcome: &TickOutcome,
    signalled: bool,
    actions: &[ViewerAction],
) -> Value {
    let (status, index, boundary) = match *outcome {
        TickOutcome::Loaded { index, .. } => ("loaded", Some(index), None),
        TickOutcome::Cached { index, .. } => ("cached", Some(index), None),
        TickOutcome::Ended { index, boundary } => {
            ("ended", Some(index), Some(boundary_name(boundary)))
        }
        TickOutcome::Empty => ("empty", None, None),
        TickOutcome::Held { index } => ("held", Some(index), None),
    };
    let file = index
        .and_then(|i| player.sequence().get(i))
        .map(|path| path.display().to_string());
    let clouds: Vec<Value> = actions
        .iter()
        .filter_map(|action| match action {
            ViewerAction::ShowCloud { kind, record } => Some(("show", kind, record)),
            ViewerAction::UpdateCloud { kind, record } => Some(("update", kind, record)),
            _ => None,
        })
        .map(|(action, kind, record)| {
            json!({
                "action": action,
                "kind": kind,
                "points": record.len(),
                "bounds": record.bounds(),
            })
        })
        .collect();

    json!({
        "tick": tick,
        "outcome": status,
        "index": index,
        "file": file,
        "frames": player.sequence().len(),
        "published": outcome.published(),
        "end_of_sequence": signalled,
        "boundary": boundary,
        "clouds": clouds,
    })
}
