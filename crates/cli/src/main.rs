//! Acsess CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations from ./migrations
//! acsess-cli migrate
//!
//! # Create an admin account / change its password
//! acsess-cli admin create -l owner -p 'long password' -d "Shop owner"
//! acsess-cli admin set-password -l owner -p 'new long password'
//!
//! # Load demo catalog, default settings and the default admin
//! acsess-cli seed demo --reset
//!
//! # Remove expired two-factor login sessions
//! acsess-cli cleanup sessions
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "acsess-cli")]
#[command(author, version, about = "Acsess CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// Directory holding the SQL migrations
        #[arg(long, default_value = "migrations")]
        dir: PathBuf,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Remove stale data
    Cleanup {
        #[command(subcommand)]
        target: CleanupTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Login name
        #[arg(short, long)]
        login: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Free-form note shown in the admin list
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Replace the password of an existing account
    SetPassword {
        #[arg(short, long)]
        login: String,

        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Demo categories, products, default settings and default admin
    Demo {
        /// YAML file to load instead of the built-in demo data
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Delete catalog and orders before seeding
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum CleanupTarget {
    /// Delete expired two-factor login sessions
    Sessions,
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
        Commands::Migrate { dir } => commands::migrate::run(&dir).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                login,
                password,
                description,
            } => {
                commands::admin::create(&login, &password, description.as_deref()).await?;
            }
            AdminAction::SetPassword { login, password } => {
                commands::admin::set_password(&login, &password).await?;
            }
        },
        Commands::Seed {
            target: SeedTarget::Demo { file, reset },
        } => commands::seed::demo(file.as_deref(), reset).await?,
        Commands::Cleanup {
            target: CleanupTarget::Sessions,
        } => commands::cleanup::sessions().await?,
    }
    Ok(())
}
