//! Line-oriented driver for the subtitle-sync engine.
//!
//! Reads one command per line from stdin and prints the emitted events,
//! which makes engine behavior scriptable without a UI:
//!
//! ```text
//! $ cli ./data lesson-01
//! tick 1500
//! next
//! edit 2
//! offset end 250
//! save
//! close
//! ```

use std::io::{BufRead, Write as _};
use std::process::ExitCode;

use tracing::info;

use engine::{Command, Engine, MediaTransport, OffsetBoundary, PlayMode};

fn main() -> ExitCode {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(root), Some(media_id)) = (args.next(), args.next()) else {
        eprintln!("usage: cli <data-root> <media-id>");
        return ExitCode::FAILURE;
    };

    match run(&root, &media_id) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(root: &str, media_id: &str) -> engine::Result<()> {
    let mut engine = Engine::with_fs_store(LogTransport, root);

    report(engine.handle_command(Command::Open {
        media_id: media_id.to_string(),
    })?);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        let closing = matches!(command, Command::Close);
        match engine.handle_command(command) {
            Ok(events) => report(events),
            Err(error) => eprintln!("rejected: {error}"),
        }
        if closing {
            break;
        }
    }
    Ok(())
}

fn report(events: Vec<engine::Event>) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in events {
        let _ = writeln!(out, "{event:?}");
    }
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut parts = line.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    let command = match verb {
        "tick" => Command::Tick {
            position_ms: parse_i64(rest, "tick <position-ms>")?,
        },
        "resume" => Command::Resume,
        "mode" => Command::SetMode {
            mode: parse_mode(rest)?,
        },
        "speed" => Command::SetPlaybackSpeed {
            rate: rest
                .parse()
                .map_err(|_| format!("speed <rate>: not a number: {rest:?}"))?,
        },
        "prev" => Command::Previous,
        "next" => Command::Next,
        "seek-start" => Command::SeekStarted,
        "seek-end" => Command::SeekEnded {
            position_ms: parse_i64(rest, "seek-end <position-ms>")?,
        },
        "edit" => Command::EnterEdit {
            index: parse_index(rest, "edit <index>")?,
        },
        "offset" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let boundary = match parts.next().unwrap_or_default() {
                "start" => OffsetBoundary::Start,
                "end" => OffsetBoundary::End,
                other => return Err(format!("offset start|end <delta-ms>: got {other:?}")),
            };
            let delta = parts.next().unwrap_or_default().trim();
            Command::OffsetBoundary {
                boundary,
                delta_ms: parse_i64(delta, "offset start|end <delta-ms>")?,
            }
        }
        "text" => Command::SetEditText {
            text: rest.to_string(),
        },
        "save" => Command::SaveEdit,
        "cancel" => Command::CancelEdit,
        "record" => Command::EnterRecord {
            index: parse_index(rest, "record <index>")?,
        },
        "record-exit" => Command::ExitRecord,
        "fail" => Command::MediaFailed {
            message: rest.to_string(),
        },
        "close" | "quit" => Command::Close,
        other => return Err(format!("unknown command: {other:?}")),
    };
    Ok(Some(command))
}

fn parse_i64(value: &str, usage: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("{usage}: not an integer: {value:?}"))
}

fn parse_index(value: &str, usage: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("{usage}: not an index: {value:?}"))
}

fn parse_mode(value: &str) -> Result<PlayMode, String> {
    match value {
        "continuous" => Ok(PlayMode::Continuous),
        "single-pause" => Ok(PlayMode::SinglePause),
        "single-loop" => Ok(PlayMode::SingleLoop),
        other => Err(format!(
            "mode continuous|single-pause|single-loop: got {other:?}"
        )),
    }
}

/// Transport that only logs; lets the replay run without real media.
struct LogTransport;

impl MediaTransport for LogTransport {
    fn seek_to(&self, seconds: f64) {
        info!(seconds, "media seek");
    }

    fn play(&self) {
        info!("media play");
    }

    fn pause(&self) {
        info!("media pause");
    }

    fn set_rate(&self, rate: f64) {
        info!(rate, "media rate");
    }
}
