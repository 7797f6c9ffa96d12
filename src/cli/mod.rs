//! CLI parser and command dispatch.

mod harvest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use listharvest::config::Settings;

#[derive(Parser)]
#[command(name = "listharvest")]
#[command(about = "Harvest product listings from infinite-scroll pages")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "LISTHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest a single listing page into a JSON file
    Crawl {
        /// Listing page URL
        url: String,
        /// Number of items to collect (default: harvest.target_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Output file
        #[arg(short, long, default_value = "musinsa_products.json")]
        output: PathBuf,
    },

    /// Harvest every configured category, then merge the results
    Batch {
        /// Items per category (default: harvest.target_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Only these category keys (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Output directory (default: output.dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Merge per-category files into the catalog without harvesting
    Merge {
        /// Output directory (default: output.dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Skip the per-item `index` field
        #[arg(long)]
        no_index: bool,
    },

    /// List configured categories
    Categories,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Crawl { url, count, output } => {
            let count = count.unwrap_or(settings.harvest.target_count);
            harvest::cmd_crawl(&settings, &url, count, &output).await
        }
        Commands::Batch {
            count,
            only,
            out_dir,
        } => {
            if let Some(dir) = out_dir {
                settings.output.dir = dir;
            }
            let count = count.unwrap_or(settings.harvest.target_count);
            harvest::cmd_batch(&settings, &only, count).await
        }
        Commands::Merge { out_dir, no_index } => {
            if let Some(dir) = out_dir {
                settings.output.dir = dir;
            }
            if no_index {
                settings.output.add_indices = false;
            }
            harvest::cmd_merge(&settings)
        }
        Commands::Categories => {
            harvest::cmd_categories(&settings);
            Ok(())
        }
    }
}
