//! blinkboard - blink-activated scanning keyboard.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

use commands::run::RunArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let result = match cli.command {
        Some(Commands::Run(args)) => commands::run::run(&RunArgs::with_config(args, &config)),
        Some(Commands::Serve(ref args)) => commands::serve::run(args, &config),
        Some(Commands::Models(ref args)) => commands::models::run(args, &config),
        None => commands::run::run(&RunArgs::with_config(cli.run, &config)),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
    .into()
}
