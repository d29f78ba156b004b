//! CLI command definitions and handlers.

pub mod models;
pub mod run;
pub mod serve;

use clap::{Parser, Subcommand};

/// blinkboard - type by blinking at a scanning keyboard
#[derive(Parser)]
#[command(name = "blinkboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arguments for the default `run` command.
    #[command(flatten)]
    pub run: run::RunArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Open the camera and start scanning (default)
    Run(run::RunArgs),
    /// Serve the launcher page over HTTP
    Serve(serve::ServeArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Finished normally.
    Success,
    /// Failed with an error.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::Error => Self::from(1),
        }
    }
}
