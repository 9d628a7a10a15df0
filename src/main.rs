//! chatplug - plugin registry and function-call dispatch for chat agents
//!
//! This is the main entry point for the chatplug binary.

use anyhow::{Context, Result};
use chatplug::cli::{Args, Command};
use chatplug::config::Config;
use chatplug::logging::init_logging;
use chatplug::output::{render, Rendered};
use chatplug::plugins::{Catalog, PluginRegistry};
use chatplug::speech::OpenAiSpeech;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.debug, args.log_json);

    info!("Starting chatplug v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Config::default()
        }
    };

    let registry = PluginRegistry::initialize(&config, &Catalog::builtin());

    match args.command {
        Command::Specs { query } => {
            let specs = registry.aggregated_specs(query.as_deref());
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        Command::Source { name } => {
            println!("{}", registry.source_name_for(&name).unwrap_or_default());
        }
        Command::Call { name, args, out } => {
            let host = OpenAiSpeech::new(&config).context("Failed to set up speech synthesis")?;
            let result = registry.dispatch(&name, &host, &args).await;

            match render(&result, out.as_deref()).context("Failed to write result")? {
                Rendered::Stdout(text) => println!("{}", text),
                Rendered::Failure(message) => {
                    eprintln!("{}", message);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
