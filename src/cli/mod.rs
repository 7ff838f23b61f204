//! CLI subcommand handlers extracted from `main.rs`.
//!
//! Keeps `main.rs` slim: clap parsing stays there, the logic lives here.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::agent::ToolAgent;
use crate::chat::ChatService;
use crate::config::{self, Config};
use crate::gateway::{self, AppState, Gateway};
use crate::models::{openai, OpenAIProvider};
use crate::session::SessionManager;
use crate::store::SqliteStore;
use crate::tools::ToolRegistry;

// ── Wiring ───────────────────────────────────────────────────────────────────

/// Open the store named by `cfg`.
pub fn open_store(cfg: &Config) -> anyhow::Result<Arc<SqliteStore>> {
    let path = cfg.database_path();
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Assemble the production chat service: SQLite store, OpenAI tool agent
/// with the three built-in tools, cookie sessions.
pub fn build_chat_service(cfg: &Config, store: Arc<SqliteStore>) -> anyhow::Result<ChatService> {
    let client = openai::http_client().context("failed to build HTTP client")?;

    let api_key = config::resolve_secret(cfg.model.api_key.as_deref());
    if api_key.is_none() {
        warn!("no model API key resolved; requests will be sent unauthenticated");
    }
    let provider = OpenAIProvider::with_config(
        client.clone(),
        api_key,
        cfg.model.endpoint.clone(),
        cfg.model.model.clone(),
        cfg.model.temperature,
    );

    let mut tools_cfg = cfg.tools.clone();
    tools_cfg.web_search.api_key = config::resolve_secret(tools_cfg.web_search.api_key.as_deref());
    if tools_cfg.web_search.api_key.is_none() {
        warn!("no web search API key resolved; web search will apologise");
    }
    let tools = ToolRegistry::with_builtins(&tools_cfg, client);
    info!(
        tools = ?tools.list().iter().map(|t| t.name.clone()).collect::<Vec<_>>(),
        model = provider.model(),
        "agent configured"
    );

    let agent = ToolAgent::new(
        Arc::new(provider),
        Arc::new(tools),
        cfg.model.system_prompt.clone(),
        cfg.model.max_tool_iterations,
    );

    Ok(ChatService::new(
        store,
        Arc::new(agent),
        SessionManager::new(cfg.session.cookie_max_age_days),
    ))
}

/// Start the HTTP gateway for `cfg`.
pub async fn serve(cfg: &Config) -> anyhow::Result<Gateway> {
    let addr: SocketAddr = cfg
        .server
        .addr
        .parse()
        .with_context(|| format!("invalid server.addr: {}", cfg.server.addr))?;
    let store = open_store(cfg)?;
    let chat = build_chat_service(cfg, store)?;
    let state = AppState::new(chat, &cfg.server.static_dir);
    let gw = gateway::start_gateway(addr, state)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    Ok(gw)
}

// ── Database maintenance ────────────────────────────────────────────────────

/// Create the schema (idempotent).
pub async fn init_db(config_path: &Path) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let store = open_store(&cfg)?;
    let conversations = store.conversation_count().await?;
    println!(
        "Database ready at {} ({conversations} conversation(s)).",
        cfg.database_path().display()
    );
    Ok(())
}

/// Delete every conversation and message.
pub async fn reset_db(config_path: &Path, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("refusing to wipe the database without --yes");
    }
    let cfg = Config::load(config_path).await?;
    let store = open_store(&cfg)?;
    let (messages, conversations) = store.reset().await?;
    info!(messages, conversations, "database reset");
    println!("Deleted {messages} message(s) and {conversations} conversation(s).");
    Ok(())
}

/// Print the stored history of one conversation.
pub async fn show_history(config_path: &Path, conversation_id: i64) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let store = open_store(&cfg)?;
    let Some(created_at) = store.conversation_created_at(conversation_id).await? else {
        anyhow::bail!("conversation {conversation_id} does not exist");
    };
    println!("Conversation {conversation_id} (started {created_at})");
    let history = crate::store::ChatStore::load_history(store.as_ref(), conversation_id).await?;
    if history.is_empty() {
        println!("No messages for conversation {conversation_id}.");
    }
    for entry in history {
        println!("[{}] {}", entry.kind.as_str(), entry.text);
    }
    Ok(())
}

// ── Debug ───────────────────────────────────────────────────────────────────

/// Run one chat turn through the full orchestration and print the reply.
pub async fn debug_chat(
    config_path: &Path,
    message: &str,
    conversation: Option<i64>,
) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let store = open_store(&cfg)?;
    let chat = build_chat_service(&cfg, store)?;

    let cookie = conversation.map(|id| format!("{}={id}", crate::session::COOKIE_NAME));
    let reply = chat.handle_message(cookie.as_deref(), message).await?;

    if reply.set_cookie.is_some() {
        eprintln!("(started conversation {})", reply.conversation_id);
    }
    println!("{}", reply.reply);
    Ok(())
}
