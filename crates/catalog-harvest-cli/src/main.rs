//! Catalog Harvest — entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use catalog_harvest::HarvestPipeline;
use catalog_harvest_cli::commands::{self, HarvestOptions};
use catalog_harvest_cli::config::{
    load_harvest_config, load_taxonomy, resolve_output_path, DEFAULT_SCREENSHOT_FILE,
};
use catalog_harvest_cli::LaunchOptions;

#[derive(Parser)]
#[command(
    name = "catalog-harvest",
    about = "Harvest an infinitely-scrolling catalog page into a categorized CSV",
    version
)]
struct Cli {
    /// Catalog page to harvest (overrides the configured target).
    #[arg(long)]
    url: Option<String>,

    /// CSV output path. Also reads CATALOG_HARVEST_OUTPUT.
    #[arg(short, long)]
    output: Option<String>,

    /// Harvest configuration JSON file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Taxonomy rules JSON file.
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Chromium binary. Also reads CATALOG_HARVEST_CHROMIUM_PATH.
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Screenshot taken after extraction.
    #[arg(long, default_value = DEFAULT_SCREENSHOT_FILE)]
    screenshot: PathBuf,

    /// Skip the final screenshot.
    #[arg(long)]
    no_screenshot: bool,

    /// Print the summary report as JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract products from a saved HTML page, without a browser.
    Extract {
        /// Saved catalog page.
        file: PathBuf,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   catalog-harvest completions bash > ~/.local/share/bash-completion/completions/catalog-harvest
    ///   catalog-harvest completions zsh > ~/.zfunc/_catalog-harvest
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let output = resolve_output_path(cli.output.as_deref());
    let config = load_harvest_config(cli.config.as_deref(), cli.url.as_deref())?;
    let taxonomy = load_taxonomy(cli.taxonomy.as_deref())?;

    match cli.command {
        None => {
            println!("Catalog harvest: {}", config.target_url);
            commands::run_harvest(HarvestOptions {
                config,
                taxonomy,
                output,
                screenshot: (!cli.no_screenshot).then_some(cli.screenshot),
                launch: LaunchOptions {
                    headed: cli.headed,
                    chromium_path: cli.chromium,
                },
                json: cli.json,
            })
            .await
        }

        Some(Commands::Extract { file }) => {
            let pipeline = HarvestPipeline::new(config, taxonomy)?;
            commands::run_extract(&pipeline, &file, &output, cli.json).await
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "catalog-harvest", &mut std::io::stdout());
            Ok(())
        }
    }
}
