//! Profile Desk CLI - Profile access from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the signed-in user's profile
//! pd-cli --access-token "$TOKEN" profile show
//!
//! # Change only the website
//! pd-cli profile update --website https://alice.dev
//!
//! # End the session at Supabase
//! pd-cli sign-out
//! ```
//!
//! # Commands
//!
//! - `profile show` - Load and print the stored profile
//! - `profile update` - Load, apply the given fields, and write back
//! - `sign-out` - Revoke the access token
//!
//! # Environment Variables
//!
//! - `PROFILE_DESK_ACCESS_TOKEN` - Access token when `--access-token` is omitted
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - Supabase project access

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::profile::ProfileEdits;

#[derive(Parser)]
#[command(name = "pd-cli")]
#[command(author, version, about = "Profile Desk CLI tools")]
struct Cli {
    /// Supabase access token of the signed-in user
    #[arg(long, env = "PROFILE_DESK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or change the signed-in user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Revoke the access token at Supabase
    SignOut,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the stored profile
    Show,
    /// Change the given fields and keep the rest
    Update {
        /// Display name
        #[arg(short, long)]
        username: Option<String>,

        /// Personal website URL
        #[arg(short, long)]
        website: Option<String>,

        /// Avatar image URL
        #[arg(short, long)]
        avatar_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pd_cli=info,profile_desk_web=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let access_token = SecretString::from(cli.access_token);

    match cli.command {
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(access_token).await?,
            ProfileAction::Update {
                username,
                website,
                avatar_url,
            } => {
                let edits = ProfileEdits {
                    username,
                    website,
                    avatar_url,
                };
                commands::profile::update(access_token, edits).await?;
            }
        },
        Commands::SignOut => commands::profile::sign_out(access_token).await?,
    }
    Ok(())
}
