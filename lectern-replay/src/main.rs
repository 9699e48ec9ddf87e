//! Command-line inspection and headless replay of annotation recordings.
//!
//! ```bash
//! # Summarize a recording
//! lectern-replay inspect lecture.rec
//!
//! # Dump a captured live stream as JSON
//! lectern-replay inspect capture.bin --stream --json
//!
//! # Replay into a four-page whiteboard
//! RUST_LOG=debug lectern-replay replay lecture.rec --pages 4
//! ```

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use crate::commands::CliError;
use crate::config::ReplayConfig;

#[derive(Parser, Debug)]
#[command(name = "lectern-replay", about = "Inspect and replay annotation recordings", version)]
struct Cli {
    /// JSON config file with `playback` and `stream` sections
    #[arg(short, long, env = "LECTERN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Largest accepted envelope body in bytes
    #[arg(long, env = "LECTERN_MAX_RECORD_BYTES", global = true)]
    max_record_bytes: Option<usize>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a file and print a summary
    Inspect {
        file: PathBuf,
        /// Treat the file as a captured envelope stream
        #[arg(long)]
        stream: bool,
    },
    /// Replay a recording into a blank whiteboard and count shapes per page
    Replay {
        file: PathBuf,
        /// Pages in the replay document (default: highest recorded page + 1)
        #[arg(short, long)]
        pages: Option<i32>,
    },
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config =
        ReplayConfig::load(cli.config.as_deref())?.with_max_record_bytes(cli.max_record_bytes);

    match cli.command {
        Commands::Inspect { file, stream } => {
            let report = commands::inspect(&file, stream, &config)?;
            if cli.json {
                Ok(serde_json::to_string_pretty(&report)?)
            } else {
                Ok(report.to_text())
            }
        }
        Commands::Replay { file, pages } => {
            let report = commands::replay(&file, pages, config.playback)?;
            info!(
                "Replayed {}: {} actions, {} failed",
                file.display(),
                report.executed,
                report.failed
            );
            if cli.json {
                Ok(serde_json::to_string_pretty(&report)?)
            } else {
                Ok(report.to_text())
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(output) => {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["lectern-replay", "inspect", "a.rec", "--stream", "--json"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Inspect { stream: true, .. }
        ));
    }

    #[test]
    fn test_parse_replay_pages() {
        let cli = Cli::try_parse_from(["lectern-replay", "replay", "a.rec", "--pages", "4"]).unwrap();
        let Commands::Replay { file, pages } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(file, PathBuf::from("a.rec"));
        assert_eq!(pages, Some(4));
    }

    #[test]
    fn test_run_reports_missing_file() {
        let cli = Cli::try_parse_from(["lectern-replay", "inspect", "/nonexistent/x.rec"]).unwrap();
        assert!(matches!(run(cli), Err(CliError::Read { .. })));
    }
}
