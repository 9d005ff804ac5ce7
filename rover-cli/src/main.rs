mod cli;
mod run;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(err) = dispatch(cli) {
        if verbose {
            eprintln!("{} {:?}", "error:".red().bold(), err);
        } else {
            eprintln!("{} {}", "error:".red().bold(), err);
        }
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            file,
            events,
            log_level,
        } => run::run_file(&file, events.as_deref(), &log_level),
    }
}
