//! ProductFeed CLI - Feed generation from catalog exports
//!
//! Commands: schema, validate, render
//! Reports JSON to stdout, feeds as RSS XML
//! Returns 2 when entries are (or would be) skipped

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use productfeed_core::{
    load_catalog, logging::init_logging, FeedConfig, FeedError, FeedRenderer, FieldSchema,
    SlugUrlBuilder,
};

#[derive(Parser)]
#[command(name = "productfeed-cli")]
#[command(about = "ProductFeed CLI - Merchant Feed Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to feed configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a custom field schema (JSON)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the active feed schema
    Schema,

    /// Report which products would be skipped
    Validate {
        /// Catalog JSON (array of products)
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Render the feed document
    Render {
        /// Catalog JSON (array of products)
        #[arg(long)]
        catalog: PathBuf,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_renderer(cli: &Cli) -> Result<FeedRenderer, FeedError> {
    let config = match &cli.config {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };

    let url_builder = Arc::new(SlugUrlBuilder::new(config.channel.link.clone()));
    let mut renderer = FeedRenderer::new(config, url_builder);
    if let Some(path) = &cli.schema {
        renderer = renderer.with_schema(FieldSchema::load(path)?);
    }
    Ok(renderer)
}

fn run(cli: Cli) -> Result<ExitCode, FeedError> {
    let renderer = build_renderer(&cli)?;

    match cli.command {
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(renderer.schema())?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { catalog } => {
            let products = load_catalog(&catalog)?;
            let checks = renderer.check_catalog(&products);
            println!("{}", serde_json::to_string_pretty(&checks)?);

            if checks.iter().all(|c| c.valid) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2)) // Entries would be skipped
            }
        }

        Commands::Render { catalog, output } => {
            let products = load_catalog(&catalog)?;
            let document = renderer.render_catalog(&products);
            let xml = document.to_rss()?;

            match output {
                Some(path) => fs::write(&path, xml)?,
                None => println!("{}", xml),
            }

            if document.len() == products.len() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2)) // Some entries skipped
            }
        }
    }
}
