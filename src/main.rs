mod cli;
mod config;
mod gemini_client;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::explore::ExploreContext;
use crate::cli::explore::conversation_state::PromptSession;
use crate::cli::explore::form::{Field, FormController};
use crate::cli::explore::location::{Position, parse_coordinates};
use crate::config::Config;
use crate::gemini_client::GeminiClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the cities of a state (interactive unless both names are given)
    Explore {
        /// State, province or region name
        #[arg(short, long)]
        state: Option<String>,

        /// Country name
        #[arg(short, long)]
        country: Option<String>,

        /// Filter the printed cities (one-shot mode, needs --state and --country)
        #[arg(long, requires_all = ["state", "country"])]
        search: Option<String>,

        /// Pre-fill the form from coordinates instead of names, e.g. --at 19.07,72.88
        #[arg(
            long,
            value_parser = parse_at,
            allow_hyphen_values = true,
            conflicts_with_all = ["state", "country"]
        )]
        at: Option<Position>,
    },
    /// Detect state and country from your location
    Locate {
        /// Use these coordinates instead of the IP-based position
        #[arg(long, value_parser = parse_at, allow_hyphen_values = true)]
        at: Option<Position>,
    },
}

fn parse_at(raw: &str) -> std::result::Result<Position, String> {
    parse_coordinates(raw).map_err(|_| "expected LAT,LON in decimal degrees".to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting City Explorer");

    let config = Config::from_env()?;
    let client = GeminiClient::new(config.gemini.clone());
    let form = FormController::new(PromptSession::new(client));
    let mut context = ExploreContext::new(Box::new(io::stdout()), form, config.location.clone());

    match cli.command {
        Some(Commands::Explore {
            state: Some(state),
            country: Some(country),
            search,
            ..
        }) => {
            let found = context.run_once(&state, &country, search.as_deref()).await?;
            Ok(exit_code(found))
        }
        Some(Commands::Explore { state, country, at, search: _ }) => {
            if let Some(state) = state {
                context.form_mut().set_field(Field::StateName, state);
            }
            if let Some(country) = country {
                context.form_mut().set_field(Field::CountryName, country);
            }
            context.run(at).await
        }
        Some(Commands::Locate { at }) => {
            let located = context.locate_once(at).await?;
            Ok(exit_code(located))
        }
        // Default to the interactive explorer if no subcommand is provided
        None => context.run(None).await,
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
