mod commands;
mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use helpdesk_ai::{AiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use helpdesk_channels::TelegramDelivery;
use helpdesk_core::{Channel, Priority, TicketId, TicketStatus};
use helpdesk_router::{EngineConfig, RoutingEngine};
use helpdesk_store::DuckStore;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Ticket routing and auto-resolution engine", long_about = None)]
#[command(version)]
struct Cli {
    /// DuckDB database file
    #[arg(long, global = true, env = "HELPDESK_DB", default_value = "helpdesk.duckdb")]
    db: PathBuf,

    /// Chat-completion API key; without one the offline fallbacks are used
    #[arg(long, global = true, env = "HELPDESK_AI_API_KEY", hide_env_values = true)]
    ai_key: Option<String>,

    #[arg(long, global = true, env = "HELPDESK_AI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    ai_base_url: String,

    #[arg(long, global = true, env = "HELPDESK_AI_MODEL", default_value = DEFAULT_MODEL)]
    ai_model: String,

    /// Upper bound on each model call
    #[arg(long, global = true, env = "HELPDESK_AI_TIMEOUT_SECS", default_value_t = 15)]
    ai_timeout_secs: u64,

    /// Minimum classifier confidence for an automated answer
    #[arg(long, global = true, default_value_t = 0.8)]
    confidence_threshold: f64,

    /// Bot token used to deliver agent replies to chat-bot tickets
    #[arg(long, global = true, env = "HELPDESK_TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, route and store a new contact
    Create {
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long, default_value = "portal")]
        channel: Channel,
        #[arg(long, default_value = "ru")]
        language: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        request_type: Option<String>,
    },

    /// Add a customer follow-up to a ticket
    Continue {
        id: TicketId,
        text: String,
        #[arg(long)]
        language: Option<String>,
    },

    /// Store a ticket triaged upstream, without classification
    External {
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        department: String,
        #[arg(long, default_value = "P3")]
        priority: Priority,
        #[arg(long, default_value = "new")]
        status: TicketStatus,
        #[arg(long, default_value = "email")]
        channel: Channel,
        #[arg(long, default_value = "ru")]
        language: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        request_type: Option<String>,
    },

    /// Open an empty chat-bot ticket for a chat
    Placeholder {
        chat_id: String,
        #[arg(long, default_value = "other")]
        request_type: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },

    /// Override a ticket's status and fields
    Status {
        id: TicketId,
        /// new, in_progress, closed or auto_closed
        status: String,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        request_type: Option<String>,
        #[arg(long)]
        automation_disabled: Option<bool>,
    },

    /// Record that the customer confirmed the answer helped
    Confirm { id: TicketId },

    /// Show one ticket with its transcript and timing
    Show { id: TicketId },

    /// List tickets, newest first
    List {
        #[arg(long)]
        status: Option<TicketStatus>,
        #[arg(long)]
        channel: Option<Channel>,
    },

    /// Post an agent reply (delivered to chat-bot tickets)
    Reply {
        id: TicketId,
        body: String,
        #[arg(long)]
        language: Option<String>,
    },

    /// Summarize a ticket's conversation
    Summary { id: TicketId },

    /// Suggest agent replies for a ticket
    Suggest { id: TicketId },

    /// Mark a ticket's latest classification as wrong
    Misclassified { id: TicketId },

    /// Help desk overview
    Analytics {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Manage canned answers
    Faq {
        #[command(subcommand)]
        action: FaqCommands,
    },

    /// Manage departments
    Department {
        #[command(subcommand)]
        action: DepartmentCommands,
    },

    /// Route one inbound mail and print the reply to send
    Mail {
        #[arg(long)]
        from: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Our own mailbox; mail from it is ignored
        #[arg(long, env = "HELPDESK_MAIL_ADDRESS", default_value = "")]
        own_address: String,
    },

    /// Auto-close idle tickets on a channel
    Sweep {
        #[arg(long, default_value = "email")]
        channel: Channel,
        /// Inactivity window (default 60)
        #[arg(long)]
        idle_minutes: Option<u64>,
    },
}

#[derive(Subcommand)]
enum FaqCommands {
    Add {
        question: String,
        answer: String,
        #[arg(long, default_value = "ru")]
        language: String,
        #[arg(long)]
        category: Option<String>,
        /// Never use this entry for automated answers
        #[arg(long)]
        manual: bool,
    },
    List {
        #[arg(long)]
        language: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum DepartmentCommands {
    Rename { code: String, name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::debug!("helpdesk v{}", env!("CARGO_PKG_VERSION"));

    let engine = build_engine(&cli)?;
    commands::run(&engine, cli.command).await
}

fn build_engine(cli: &Cli) -> anyhow::Result<RoutingEngine> {
    let store = DuckStore::open_persistent(&cli.db)
        .with_context(|| format!("opening {}", cli.db.display()))?;
    tracing::debug!(tickets = store.ticket_count()?, "store ready");

    let ai = AiConfig {
        api_key: cli.ai_key.clone(),
        base_url: cli.ai_base_url.clone(),
        model: cli.ai_model.clone(),
        timeout: Duration::from_secs(cli.ai_timeout_secs),
        ..AiConfig::default()
    };
    let gateways = helpdesk_ai::select(&ai).context("configuring model gateways")?;

    let config = EngineConfig {
        confidence_threshold: cli.confidence_threshold,
        call_timeout: ai.timeout,
        ..EngineConfig::default()
    };
    let mut engine = RoutingEngine::new(Arc::new(store), gateways, config);

    if let Some(token) = cli.telegram_token.as_deref().filter(|t| !t.trim().is_empty()) {
        let delivery = TelegramDelivery::new(token).context("configuring Telegram delivery")?;
        engine = engine.with_delivery(Arc::new(delivery));
    }
    Ok(engine)
}
