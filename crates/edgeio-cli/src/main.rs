//! `edgeio`: inspect board attribute tables and replay recorded edge traces.
//!
//! ```sh
//! edgeio attrs --config board.json
//! edgeio -v replay --config board.json --trace card-swipe.json
//! ```
//!
//! Replays run on the mock GPIO backend; the board's lines start idle high.
//! Logs go to stderr and follow `RUST_LOG` when set.

mod replay;
mod trace;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use edgeio_core::BoardConfig;
use replay::Replay;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "edgeio", version, about = "Edge-timed input decoder tools")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the attributes a board configuration exposes
    Attrs {
        /// Board configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Replay an edge trace and print attribute reads
    Replay {
        /// Board configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Trace of timed edges and attribute accesses (JSON)
        #[arg(short, long)]
        trace: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<BoardConfig> {
    BoardConfig::from_json_file(path)
        .with_context(|| format!("loading board configuration {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Attrs { config } => {
            let config = load_config(&config)?;
            let replay = Replay::new(&config)?;
            let board = replay.board();
            for path in board.attributes() {
                writeln!(out, "{:<3} {path}", board.access(path)?.to_string())?;
            }
        }
        Command::Replay { config, trace } => {
            let config = load_config(&config)?;
            let steps = trace::load(&trace)?;
            let mut replay = Replay::new(&config)?;
            replay.run(&steps, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
