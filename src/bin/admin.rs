//! CLI administration tool for remember-me credentials.
//!
//! Works directly against the PostgreSQL store, without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Log a user out of every browser
//! cargo run --bin admin -- credentials revoke-user alice
//!
//! # Revoke a single credential
//! cargo run --bin admin -- credentials revoke q3Xl0v6m2kq3Y0bR1c8sWn3A
//!
//! # Remove expired records now instead of waiting for the purge task
//! cargo run --bin admin -- credentials purge-expired
//!
//! # Count live credentials, overall or for one user
//! cargo run --bin admin -- credentials count --user alice
//!
//! # Check database connection / apply migrations
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, or `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`

use remember_me::application::services::{RememberMeService, RememberMeSettings};
use remember_me::config::{Config, mask_connection_string};
use remember_me::infrastructure::persistence::PgCredentialStore;
use remember_me::utils::selector::is_valid_selector;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing remember-me credentials.
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
    /// Manage remember-me credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Credential management subcommands.
#[derive(Subcommand)]
enum CredentialAction {
    /// Revoke every credential of a user
    RevokeUser {
        /// User identity as passed when the credential was issued
        user: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Revoke a single credential by selector
    Revoke {
        selector: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete expired credentials
    PurgeExpired,

    /// Count live credentials
    Count {
        /// Only count this user's credentials
        #[arg(short, long)]
        user: Option<String>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url().context("Database is not configured")?;

    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })?;

    match cli.command {
        Commands::Credentials { action } => handle_credential_action(action, pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches credential management commands.
async fn handle_credential_action(action: CredentialAction, pool: PgPool) -> Result<()> {
    let store = Arc::new(PgCredentialStore::new(Arc::new(pool)));
    let service = RememberMeService::new(store.clone(), RememberMeSettings::default());

    match action {
        CredentialAction::RevokeUser { user, yes } => {
            revoke_user(&service, &store, &user, yes).await?
        }
        CredentialAction::Revoke { selector, yes } => {
            revoke_selector(&service, &selector, yes).await?
        }
        CredentialAction::PurgeExpired => purge_expired(&service, &store).await?,
        CredentialAction::Count { user } => count(&store, user.as_deref()).await?,
    }

    Ok(())
}

fn confirm(prompt: &str, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
    }

    Ok(confirmed)
}

/// Revokes all credentials of `user` after showing how many are live.
async fn revoke_user(
    service: &RememberMeService,
    store: &PgCredentialStore,
    user: &str,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔒 Revoke user credentials".bright_blue().bold());
    println!();

    let live = store
        .count_live_for_user(user)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("  User:              {}", user.cyan());
    println!("  Live credentials:  {}", live.to_string().bright_white());
    println!();

    if live == 0 {
        println!("{}", "⚠️  No live credentials for this user".yellow());
    }

    if !confirm("Revoke all credentials of this user?", skip_confirm)? {
        return Ok(());
    }

    service
        .revoke_user(user)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke credentials: {}", e))?;

    println!();
    println!("{}", "✅ Credentials revoked".green().bold());
    println!();

    Ok(())
}

/// Revokes one credential by selector.
async fn revoke_selector(
    service: &RememberMeService,
    selector: &str,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔒 Revoke credential".bright_blue().bold());
    println!();

    if !is_valid_selector(selector) {
        anyhow::bail!("'{}' is not a valid selector", selector);
    }

    println!("  Selector: {}", selector.cyan());
    println!();

    if !confirm("Revoke this credential?", skip_confirm)? {
        return Ok(());
    }

    service
        .revoke_selector(selector)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke credential: {}", e))?;

    println!();
    println!("{}", "✅ Credential revoked".green().bold());
    println!();

    Ok(())
}

async fn purge_expired(service: &RememberMeService, store: &PgCredentialStore) -> Result<()> {
    println!("{}", "🧹 Purging expired credentials...".bright_blue());

    let pending = store
        .count_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
    if pending == 0 {
        println!("{}", "  Nothing to purge".yellow());
        return Ok(());
    }

    let purged = service
        .purge_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge: {}", e))?;

    println!(
        "{} {}",
        "✅ Purged".green().bold(),
        purged.to_string().bright_white().bold()
    );

    Ok(())
}

async fn count(store: &PgCredentialStore, user: Option<&str>) -> Result<()> {
    println!("{}", "📊 Live credentials".bright_blue().bold());
    println!();

    let count = match user {
        Some(user) => store.count_live_for_user(user).await,
        None => store.count_live().await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    if let Some(user) = user {
        println!("  User:  {}", user.cyan());
    }
    println!("  Live:  {}", count.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Migrate => {
            println!("{}", "🔧 Applying migrations...".bright_blue());

            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Failed to run migrations")?;

            println!("{}", "✅ Migrations applied".green().bold());
        }
    }

    Ok(())
}
