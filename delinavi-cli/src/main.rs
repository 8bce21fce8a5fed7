//! DeliNavi CLI - Command-line interface
//!
//! Replays recorded delivery runs through the guidance engine and manages the
//! configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::replay::ReplayArgs;

#[derive(Debug, Parser)]
#[command(name = "delinavi")]
#[command(version, about = "Turn-by-turn guidance for delivery couriers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the configuration file with default values
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Replay a recorded route and fix log, printing events as JSON lines
    Replay {
        /// Route file: JSON array of {"lat", "lng"} points
        #[arg(long)]
        route: PathBuf,

        /// Fix log: JSON array of {"lat", "lng", "speed"?, "heading"?, "t"}
        #[arg(long)]
        fixes: PathBuf,

        /// Stop list: JSON array of stops; the leg follows them when given
        #[arg(long)]
        stops: Option<PathBuf>,

        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,

        /// Announcement language tag (e.g. ja-JP, en-US)
        #[arg(long)]
        lang: Option<String>,

        /// Run without a leg so the companion announcer drives cues
        #[arg(long)]
        companion: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config { command } => commands::config::run(command),
        Commands::Replay {
            route,
            fixes,
            stops,
            config,
            lang,
            companion,
        } => commands::replay::run(ReplayArgs {
            route,
            fixes,
            stops,
            config,
            lang,
            companion,
        }),
    };

    if let Err(e) = result {
        e.exit();
    }
}
