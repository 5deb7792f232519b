//! Operator CLI for admin accounts and member support
//!
//! Reads the same environment as the server. Every command prints one JSON
//! object on stdout.

use anyhow::{Context, Result};
use chamber_core::common::utils::normalize_email;
use chamber_core::common::Actor;
use chamber_core::config::Config;
use chamber_core::domains::auth::activities::create_admin;
use chamber_core::domains::member::activities::{admin_reset_password, registration_stats};
use chamber_core::kernel::ServerDeps;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "admin_cli")]
#[command(about = "Chamber membership operator tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },

    /// Set a member's password; generates one when --password is omitted
    ResetMemberPassword {
        /// Admin account the reset is performed as
        #[arg(long)]
        admin: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Registration totals per verification status
    Stats {
        /// Admin account the query is performed as
        #[arg(long)]
        admin: String,
    },
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(value).context("Failed to encode output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let deps = get_deps().await?;

    match cli.command {
        Commands::CreateAdmin {
            email,
            name,
            password,
        } => {
            let admin = create_admin(&email, &name, &password, &deps)
                .await
                .context("Failed to create admin")?;
            output(&json!({
                "success": true,
                "admin": { "id": admin.id, "email": admin.email, "name": admin.name },
            }))
        }
        Commands::ResetMemberPassword {
            admin,
            email,
            password,
        } => {
            let actor = admin_actor(&admin, &deps).await?;
            let result = admin_reset_password(actor, &email, password, &deps)
                .await
                .context("Failed to reset member password")?;
            output(&json!({ "success": true, "reset": result }))
        }
        Commands::Stats { admin } => {
            let actor = admin_actor(&admin, &deps).await?;
            let stats = registration_stats(actor, &deps)
                .await
                .context("Failed to load registration stats")?;
            output(&json!({ "success": true, "stats": stats }))
        }
    }
}

async fn get_deps() -> Result<ServerDeps> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    Ok(ServerDeps::from_config(pool, &config))
}

/// Commands that act on members run as a named admin account.
async fn admin_actor(email: &str, deps: &ServerDeps) -> Result<Actor> {
    let admin = deps
        .admins
        .find_admin_by_email(&normalize_email(email))
        .await
        .context("Failed to look up admin")?
        .with_context(|| format!("No admin account for {email}"))?;
    Ok(Actor::new(admin.id, true))
}
