//! dnd-replay: replays recorded client requests against a widget fixture.
//!
//! The tool builds one session from a widget fixture, feeds it every request
//! of a recording, and prints one JSON line per request with the
//! reconciliation report (phases run, phases skipped, final operation and the
//! overrides the next response would carry).
//!
//! # Usage
//!
//! ```text
//! dnd-replay --fixture <FILE> --messages <FILE> [OPTIONS]
//!
//! Options:
//!   --config        <FILE>  TOML configuration file [default: dnd.toml]
//!   --snapshot              Write the session's drag state when done
//!   --snapshot-dir  <DIR>   Overrides the configured snapshot directory
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable           | Description                     |
//! |--------------------|---------------------------------|
//! | `DND_CONFIG`       | Configuration file path         |
//! | `DND_SNAPSHOT_DIR` | Snapshot directory              |
//! | `RUST_LOG`         | Log filter; overrides the config |
//!
//! Logs go to stderr so stdout stays a clean stream of JSON lines.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dnd_server::application::replay::{parse_recording, replay};
use dnd_server::application::ui_session::UiSession;
use dnd_server::infrastructure::fixture::load_fixture;
use dnd_server::infrastructure::storage::config::load_config;
use dnd_server::infrastructure::storage::snapshot::write_snapshot;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Replays drag-and-drop client requests against server-side listeners.
#[derive(Debug, Parser)]
#[command(
    name = "dnd-replay",
    about = "Replays recorded drag-and-drop client requests through the reconciliation engine",
    version
)]
struct Cli {
    /// JSON widget fixture describing shells, controls, sources and targets.
    #[arg(long)]
    fixture: PathBuf,

    /// JSON array of client messages to replay, in order.
    #[arg(long)]
    messages: PathBuf,

    /// TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "dnd.toml", env = "DND_CONFIG")]
    config: PathBuf,

    /// Write the session's drag state to the snapshot directory when done.
    #[arg(long)]
    snapshot: bool,

    /// Snapshot directory.  Overrides `[snapshot] directory` of the config.
    #[arg(long, env = "DND_SNAPSHOT_DIR")]
    snapshot_dir: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        fixture = %cli.fixture.display(),
        messages = %cli.messages.display(),
        "dnd-replay starting"
    );

    let widgets = load_fixture(&cli.fixture)
        .with_context(|| format!("loading fixture {}", cli.fixture.display()))?;
    let recording = std::fs::read_to_string(&cli.messages)
        .with_context(|| format!("reading messages {}", cli.messages.display()))?;
    let messages = parse_recording(&recording)
        .with_context(|| format!("parsing messages {}", cli.messages.display()))?;

    let mut session = UiSession::new(widgets, config.engine);
    let records = replay(&mut session, &messages);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        serde_json::to_writer(&mut out, record).context("writing report")?;
        writeln!(out).context("writing report")?;
    }

    if cli.snapshot {
        let dir = cli.snapshot_dir.unwrap_or(config.snapshot.directory);
        let path = write_snapshot(&dir, &session.snapshot())
            .with_context(|| format!("writing snapshot to {}", dir.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }

    session.close();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_fixture_and_messages() {
        // Arrange / Act
        let result = Cli::try_parse_from(["dnd-replay"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["dnd-replay", "--fixture", "f.json", "--messages", "m.json"]);

        assert_eq!(cli.fixture, PathBuf::from("f.json"));
        assert_eq!(cli.messages, PathBuf::from("m.json"));
        assert!(!cli.snapshot);
    }

    #[test]
    fn test_cli_snapshot_options() {
        let cli = Cli::parse_from([
            "dnd-replay",
            "--fixture",
            "f.json",
            "--messages",
            "m.json",
            "--snapshot",
            "--snapshot-dir",
            "/tmp/snaps",
        ]);

        assert!(cli.snapshot);
        assert_eq!(cli.snapshot_dir, Some(PathBuf::from("/tmp/snaps")));
    }

    #[test]
    fn test_cli_config_override() {
        let cli = Cli::parse_from([
            "dnd-replay",
            "--fixture",
            "f.json",
            "--messages",
            "m.json",
            "--config",
            "/etc/dnd/replay.toml",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/dnd/replay.toml"));
    }
}
