//! CRM Forms CLI
//!
//! Command-line front end for the dynamic form engine.
//!
//! # Usage
//!
//! ```bash
//! crmforms validate --form contact.json --data response.json
//! crmforms controls --form contact.json --format json
//! crmforms fill --form contact.json --data response.json
//! crmforms fetch newsletter-signup
//! crmforms submit newsletter-signup --data response.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use crm_forms::FormsConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "crmforms")]
#[command(version)]
#[command(about = "CRM web-form engine", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, env = "CRMFORMS_CONFIG")]
    config: Option<PathBuf>,

    /// Platform API endpoint URL
    #[arg(long, env = "CRMFORMS_API_URL")]
    api_url: Option<String>,

    /// API key for authentication
    #[arg(long, env = "CRMFORMS_API_KEY")]
    api_key: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a response against a form definition
    Validate {
        /// Form definition (JSON)
        #[arg(long)]
        form: PathBuf,
        /// Field values (JSON object)
        #[arg(long)]
        data: PathBuf,
    },
    /// Show the controls a form renders, with default values
    Controls {
        #[arg(long)]
        form: PathBuf,
    },
    /// Fill and submit a form against a local in-memory store
    Fill {
        #[arg(long)]
        form: PathBuf,
        #[arg(long)]
        data: PathBuf,
    },
    /// Fetch a form from the platform API and show its controls
    Fetch { id: String },
    /// Fill and submit a form through the platform API
    Submit {
        id: String,
        #[arg(long)]
        data: PathBuf,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match FormsConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if cli.api_key.is_some() {
        config.api_key = cli.api_key;
    }

    init_tracing(&config.log_level);

    let result = match cli.command {
        Commands::Validate { form, data } => commands::validate::handle(&form, &data, cli.format),
        Commands::Controls { form } => commands::controls::handle(&form, cli.format),
        Commands::Fill { form, data } => commands::fill::handle(&form, &data, &config, cli.format).await,
        Commands::Fetch { id } => commands::remote::fetch(&id, &config, cli.format).await,
        Commands::Submit { id, data } => commands::remote::submit(&id, &data, &config, cli.format).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
