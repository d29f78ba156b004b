//! Models command - manage ML models.

use std::path::PathBuf;

use anyhow::Result;
use blinkboard_adapters::models::{
    ensure_models_with_progress, list_models as adapter_list_models, resolve_models_dir,
    missing_models, MODELS,
};
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download required models
    Fetch,
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let dir = resolve_models_dir(args.models_dir.as_deref().or(config.models.dir.as_deref()));
    match args.command {
        ModelsCommand::Fetch => {
            let missing = missing_models(&dir);
            if missing.is_empty() {
                println!("All models present in {}", dir.display());
                return Ok(());
            }
            let Some(base_url) = config.models.base_url.as_deref() else {
                let list: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
                anyhow::bail!(
                    "No download location configured for {}. Copy the files there, \
                     or set `models.base_url` in the config file to a location serving them.",
                    list.join(", ")
                );
            };
            fetch_models(&dir, base_url)
        }
        ModelsCommand::List => {
            list_models(&dir);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn fetch_models(dir: &std::path::Path, base_url: &str) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let mut current = String::new();
    let mut report = |name: &str, downloaded: u64, total: Option<u64>| {
        if current != name {
            current = name.to_string();
            pb.set_position(0);
            pb.set_length(total.unwrap_or(0));
            pb.set_message(current.clone());
        }
        pb.set_position(downloaded);
    };
    ensure_models_with_progress(dir, base_url, &mut report)?;

    pb.finish_with_message("All models present");
    Ok(())
}

fn list_models(dir: &std::path::Path) {
    let models = adapter_list_models(dir);

    println!("Models directory: {}", dir.display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let filename = MODELS
            .iter()
            .find(|m| m.name == *name)
            .map_or("unknown", |m| m.filename);
        println!("  {status} {name} ({filename})");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
