//! CLI administration tool for the shortener.
//!
//! Inspects, creates and removes mappings directly in the configured store,
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show a mapping and its hit count
//! cargo run --bin admin -- link show aB3dE9x
//!
//! # Delete a mapping
//! cargo run --bin admin -- link delete aB3dE9x
//!
//! # Shorten a URL
//! cargo run --bin admin -- shorten https://example.com --code promo --expiry-hours 48
//!
//! # Remove expired mappings now
//! cargo run --bin admin -- sweep
//!
//! # Check store connectivity
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `STORAGE_BACKEND`, `DATABASE_URL`, `STORAGE_REDIS_URL`,
//! `REDIS_URL`, `BASE_URL`, ... The in-memory backend starts empty on every run,
//! so the tool is only useful against PostgreSQL or Redis.

use shortener::application::MAX_EXPIRY_HOURS;
use shortener::application::services::{LinkService, ShortenOptions};
use shortener::config::{self, Config, StorageBackend};
use shortener::domain::repositories::MappingStore;
use shortener::infrastructure::persistence;
use shortener::server;
use shortener::utils::code_generator::RandomCodeGenerator;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use std::sync::Arc;

/// CLI tool for managing short links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or remove a single link
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Create a short link
    Shorten {
        /// URL to shorten (prompted for if omitted)
        url: Option<String>,

        /// Custom short code
        #[arg(short, long)]
        code: Option<String>,

        /// Lifetime in hours; 0 means never expires
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(0..=87_600))]
        expiry_hours: Option<u64>,
    },

    /// Remove every expired mapping now
    Sweep,

    /// Store operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Single-link subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Show a mapping with its hit count
    Show { code: String },

    /// Delete a mapping
    Delete {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Store operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check store connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    if config.storage_backend == StorageBackend::Memory {
        println!(
            "{}",
            "⚠️  STORAGE_BACKEND is 'memory'; changes will not outlive this command".yellow()
        );
    }

    let store = persistence::connect(&config).await?;

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &config, store).await?,
        Commands::Shorten {
            url,
            code,
            expiry_hours,
        } => shorten(&config, store, url, code, expiry_hours).await?,
        Commands::Sweep => sweep(&config, store).await?,
        Commands::Db { action } => handle_db_action(action, store.as_ref()).await?,
    }

    Ok(())
}

async fn link_service(config: &Config, store: Arc<dyn MappingStore>) -> LinkService {
    let cache = server::connect_cache(config).await;
    let generator = Arc::new(RandomCodeGenerator::new(config.code_length));

    LinkService::new(
        store,
        generator,
        cache,
        config.engine_settings(),
        config.base_url.clone(),
    )
}

/// Dispatches single-link commands.
async fn handle_link_action(
    action: LinkAction,
    config: &Config,
    store: Arc<dyn MappingStore>,
) -> Result<()> {
    match action {
        LinkAction::Show { code } => show_link(store.as_ref(), &code).await,
        LinkAction::Delete { code, yes } => {
            let service = link_service(config, store).await;
            delete_link(&service, &code, yes).await
        }
    }
}

/// Prints a mapping, including expired ones that have not been swept yet.
async fn show_link(store: &dyn MappingStore, code: &str) -> Result<()> {
    println!("{}", "🔗 Link".bright_blue().bold());
    println!();

    let mapping = store
        .get(code)
        .await
        .map_err(|e| anyhow::anyhow!("Store error: {}", e))?
        .with_context(|| format!("No link stored under '{}'", code))?;

    let status = if mapping.is_expired() {
        "EXPIRED".red()
    } else {
        "LIVE".green()
    };

    println!("  Code:    {}", mapping.code.cyan());
    println!("  URL:     {}", mapping.original_url);
    println!("  Status:  {}", status);
    println!(
        "  Hits:    {}",
        mapping.hit_count.to_string().bright_white().bold()
    );
    println!(
        "  Created: {}",
        mapping
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .bright_black()
    );
    match mapping.expires_at {
        Some(at) => println!(
            "  Expires: {}",
            at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
        ),
        None => println!("  Expires: {}", "never".bright_black()),
    }
    println!();

    Ok(())
}

/// Deletes a link after confirmation (default: No).
async fn delete_link(service: &LinkService, code: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Delete Link".bright_blue().bold());
    println!();
    println!("  Code: {}", code.cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service
        .delete_link(code)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

    println!("{}", "✅ Link deleted".green().bold());
    println!();

    Ok(())
}

async fn shorten(
    config: &Config,
    store: Arc<dyn MappingStore>,
    url: Option<String>,
    code: Option<String>,
    expiry_hours: Option<u64>,
) -> Result<()> {
    println!("{}", "✂️  Shorten URL".bright_blue().bold());
    println!();

    let url = match url {
        Some(u) => u,
        None => Input::new().with_prompt("URL").interact_text()?,
    };

    let options = ShortenOptions {
        custom_code: code,
        expires_in: expiry_hours.map(|hours| match hours {
            0 => None,
            h => Some(Duration::hours(h.min(MAX_EXPIRY_HOURS) as i64)),
        }),
    };

    let service = link_service(config, store).await;
    let link = service
        .shorten_with(&url, options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to shorten: {}", e))?;

    if link.reused {
        println!("{}", "♻️  Reusing existing link".yellow());
    } else {
        println!("{}", "✅ Link created".green().bold());
    }
    println!();
    println!("  Short:   {}", link.short_url.bright_yellow().bold());
    println!("  Code:    {}", link.mapping.code.cyan());
    match link.mapping.expires_at {
        Some(at) => println!(
            "  Expires: {}",
            at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
        ),
        None => println!("  Expires: {}", "never".bright_black()),
    }
    println!();

    Ok(())
}

async fn sweep(config: &Config, store: Arc<dyn MappingStore>) -> Result<()> {
    println!("{}", "🧹 Expiry Sweep".bright_blue().bold());
    println!();

    let service = link_service(config, store).await;
    let removed = service
        .sweep_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "  Removed {} expired mapping(s) at {}",
        removed.to_string().bright_white().bold(),
        Utc::now().format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );
    if config.storage_backend == StorageBackend::Redis {
        println!(
            "  {}",
            "Redis expires keys on its own; nothing to sweep".bright_black()
        );
    }
    println!();

    Ok(())
}

/// Dispatches store commands.
async fn handle_db_action(action: DbAction, store: &dyn MappingStore) -> Result<()> {
    match action {
        DbAction::Check => check_store(store).await,
    }
}

async fn check_store(store: &dyn MappingStore) -> Result<()> {
    println!("{}", "🔍 Checking store connection...".bright_blue());

    if store.health_check().await {
        println!(
            "{} {}",
            "✅ Store reachable:".green().bold(),
            store.backend_name().cyan()
        );
        Ok(())
    } else {
        println!(
            "{} {}",
            "❌ Store unreachable:".red().bold(),
            store.backend_name().cyan()
        );
        anyhow::bail!("Store health check failed")
    }
}
