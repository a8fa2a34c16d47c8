//! AAA Accident Solutions CLI - migrations and back-office tasks.
//!
//! # Usage
//!
//! ```bash
//! # Create the session tables for both web apps
//! aaa-cli migrate all
//!
//! # List admin accounts waiting for approval
//! aaa-cli admin list --status pending_approval
//!
//! # Approve an account
//! aaa-cli admin approve 42
//!
//! # Active chatbot conversations mentioning "jones"
//! aaa-cli conversations list --status active --search jones
//!
//! # Follow a conversation until it ends
//! aaa-cli conversations watch 118
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the tower-sessions tables
//! - `admin` - List admin accounts and change their status
//! - `conversations` - List chatbot conversations and watch one live

#![cfg_attr(not(test), forbid(unsafe_code))]

use aaa_core::{AdminAction, AdminId, AdminStatus, ConversationId, ConversationStatus};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aaa-cli")]
#[command(author, version, about = "AAA Accident Solutions CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session store tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Review chatbot conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationCommand,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Migrate the site session store
    Site,
    /// Migrate the admin session store
    Admin,
    /// Migrate both session stores
    All,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List admin accounts, grouped by status
    List {
        /// Only show one bucket (`pending_approval`, `active`, `suspended`)
        #[arg(short, long)]
        status: Option<AdminStatus>,
    },
    /// Activate a pending account
    Approve { id: AdminId },
    /// Suspend a pending or active account
    Suspend { id: AdminId },
    /// Re-activate a suspended account
    Reinstate { id: AdminId },
    /// Permanently delete an account
    Delete {
        id: AdminId,

        /// Confirm the deletion; nothing is sent without it
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConversationCommand {
    /// List one page of conversations
    List {
        /// Filter by status (`active`, `completed`, `manual`)
        #[arg(short, long)]
        status: Option<ConversationStatus>,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Filter the page by session id, name, or email
        #[arg(long)]
        search: Option<String>,
    },
    /// Print new messages of a conversation until it stops being active
    Watch { id: ConversationId },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aaa_cli=info,aaa_admin=warn".into()),
        )
        .with_target(false)
        .init();

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
            MigrateTarget::Site => commands::migrate::site().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::site().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminCommand::List { status } => commands::admin::list(status).await?,
            AdminCommand::Approve { id } => {
                commands::admin::change_status(id, AdminAction::Approve).await?;
            }
            AdminCommand::Suspend { id } => {
                commands::admin::change_status(id, AdminAction::Suspend).await?;
            }
            AdminCommand::Reinstate { id } => {
                commands::admin::change_status(id, AdminAction::Reinstate).await?;
            }
            AdminCommand::Delete { id, yes } => commands::admin::delete(id, yes).await?,
        },
        Commands::Conversations { action } => match action {
            ConversationCommand::List {
                status,
                page,
                search,
            } => commands::conversations::list(status, page, search.as_deref()).await?,
            ConversationCommand::Watch { id } => commands::conversations::watch(id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_admin_status_filter() {
        let cli = Cli::try_parse_from(["aaa-cli", "admin", "list", "--status", "pending"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminCommand::List {
                    status: Some(AdminStatus::PendingApproval)
                }
            })
        ));
    }

    #[test]
    fn test_delete_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["aaa-cli", "admin", "delete", "7"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Admin {
                action: AdminCommand::Delete { yes: false, .. }
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_conversation_status() {
        assert!(
            Cli::try_parse_from(["aaa-cli", "conversations", "list", "--status", "open"]).is_err()
        );
    }
}
