use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rover")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show verbose output including stack traces
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a Rover Lua file against a simulated host, printing commands as JSON lines
    Run {
        /// Path to the Lua file to run
        file: PathBuf,
        /// Host events to replay, one JSON object per line
        #[arg(long, short)]
        events: Option<PathBuf>,
        /// Log level: debug, info, warn, error or nope
        #[arg(long, default_value = "warn")]
        log_level: String,
    },
}
