//! Storefront cache CLI - cache key inspection and image cache maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Key a provider request the way the SWR cache does
//! sc-cli key -m POST -u https://shop.myshopify.com/api/2021-10/graphql.json \
//!     -H "Accept-Language: en" -b '{"query":"..."}'
//!
//! # Locate the cached file for an image request
//! sc-cli image-key --src /hero.jpg --width 480 --height 480
//!
//! # Summarize the image cache directory
//! sc-cli images stats
//!
//! # Delete transformed images not written in the last 30 days
//! sc-cli images prune --older-than-days 30
//! ```
//!
//! # Commands
//!
//! - `key` - SWR request key and store entry names
//! - `image-key` - Image cache key and file path
//! - `images stats` - File count and size of the image cache
//! - `images prune` - Remove old transformed images and stray temp files

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Storefront cache CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the SWR cache key for a provider request
    Key {
        /// HTTP method
        #[arg(short, long, default_value = "POST")]
        method: String,

        /// Request URL
        #[arg(short, long)]
        url: String,

        /// Header as `Name: value`, in request order (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Compute the cache key and file path for an image request
    ImageKey {
        /// Source image (`/path` under the public dir, or an absolute URL)
        #[arg(long)]
        src: String,

        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Fit mode (`cover`, `contain`, `fill`, `inside`, `outside`)
        #[arg(long, default_value = "cover")]
        fit: String,

        /// Image cache directory (default: `IMAGE_CACHE_DIR` or .cache/images)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Maintain the image cache directory
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
}

#[derive(Subcommand)]
enum ImagesAction {
    /// Show file count and total size
    Stats {
        /// Image cache directory (default: `IMAGE_CACHE_DIR` or .cache/images)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Delete transformed images older than a cutoff
    Prune {
        /// Delete files last written more than this many days ago
        #[arg(long)]
        older_than_days: u64,

        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,

        /// Image cache directory (default: `IMAGE_CACHE_DIR` or .cache/images)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Key {
            method,
            url,
            headers,
            body,
        } => commands::key::request(&method, &url, &headers, body.as_deref())?,
        Commands::ImageKey {
            src,
            width,
            height,
            fit,
            dir,
        } => commands::key::image(&src, width, height, &fit, dir),
        Commands::Images { action } => match action {
            ImagesAction::Stats { dir } => commands::images::stats(dir).await?,
            ImagesAction::Prune {
                older_than_days,
                dry_run,
                dir,
            } => {
                commands::images::prune(dir, older_than_days, dry_run).await?;
            }
        },
    }
    Ok(())
}
