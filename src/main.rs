use recruit_chat::cli;
use recruit_chat::config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "recruit-chat", version, about = "Conversational job-seeking assistant")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server and chat UI
    Start,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Debug utilities
    Debug {
        #[command(subcommand)]
        action: DebugAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Create the schema if it does not exist
    Init,
    /// Delete every conversation and message
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Print the stored history of a conversation
    History {
        /// Conversation id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum DebugAction {
    /// Run a single chat turn and print the reply
    Chat {
        /// User message to send
        #[arg(long)]
        message: String,
        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| recruit_chat::app_home().join("config.yaml"));

    match cli.command {
        Some(Command::Start) | None => {}
        Some(Command::Db { action }) => {
            return match action {
                DbAction::Init => cli::init_db(&config_path).await,
                DbAction::Reset { yes } => cli::reset_db(&config_path, yes).await,
                DbAction::History { id } => cli::show_history(&config_path, id).await,
            };
        }
        Some(Command::Debug { action }) => {
            return match action {
                DebugAction::Chat {
                    message,
                    conversation,
                } => cli::debug_chat(&config_path, &message, conversation).await,
            };
        }
    }

    info!(path = %config_path.display(), "loading configuration");
    let cfg = config::Config::load(&config_path).await?;

    let gateway = cli::serve(&cfg).await?;
    println!("  recruit-chat v{} listening on http://{}/", env!("CARGO_PKG_VERSION"), gateway.addr);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    gateway.stop().await;
    info!("recruit-chat stopped");
    Ok(())
}
