//! Trident Nova CLI - Session table and admin grant tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table in the admin database
//! trident-cli migrate sessions
//!
//! # Grant admin access to a Firebase user ID
//! trident-cli admin grant <uid> -e admin@tridentnova.com -p '...'
//!
//! # Revoke admin access
//! trident-cli admin revoke <uid> -e admin@tridentnova.com -p '...'
//!
//! # List admins
//! trident-cli admin list -e admin@tridentnova.com -p '...'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create database tables
//! - `admin` - Manage the `admins` collection

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trident-cli")]
#[command(author, version, about = "Trident Nova CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create database tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage the admins collection
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the session table used by the admin panel
    Sessions,
}

/// Credentials of an existing admin; writes to `admins` run as this user.
#[derive(Args)]
struct SignInArgs {
    /// Email address of an existing admin
    #[arg(short, long, env = "TRIDENT_ADMIN_EMAIL")]
    email: String,

    /// Password of that admin
    #[arg(short, long, env = "TRIDENT_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin access to a user ID
    Grant {
        /// Firebase user ID to grant
        uid: String,

        #[command(flatten)]
        sign_in: SignInArgs,
    },
    /// Revoke admin access from a user ID
    Revoke {
        /// Firebase user ID to revoke
        uid: String,

        #[command(flatten)]
        sign_in: SignInArgs,
    },
    /// List user IDs with admin access
    List {
        #[command(flatten)]
        sign_in: SignInArgs,
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { uid, sign_in } => {
                commands::admin::grant(&sign_in.email, sign_in.password, &uid).await?;
            }
            AdminAction::Revoke { uid, sign_in } => {
                commands::admin::revoke(&sign_in.email, sign_in.password, &uid).await?;
            }
            AdminAction::List { sign_in } => {
                commands::admin::list(&sign_in.email, sign_in.password).await?;
            }
        },
    }
    Ok(())
}
