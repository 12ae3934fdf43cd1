use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    // Initialize logging; stdout stays reserved for results
    let default_filter = if cli.verbose > 0 {
        "trawl_cli=debug,trawl_core=debug"
    } else {
        "trawl_cli=info,trawl_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .init();

    let result = match &cli.command {
        Commands::Search(args) => search::run(&cli, args).await,
        Commands::Sources => sources::run(&cli),
        Commands::Config { action } => config::run(&cli, action),
    };

    if let Err(e) = result {
        eprintln!(
            "{}: {}",
            "Error".if_supports_color(Stderr, |t| t.red().bold().to_string()),
            e
        );
        process::exit(1);
    }
}
