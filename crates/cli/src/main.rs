//! triage - route calls and manage the agent roster from the command line
//!
//! Usage: triage [--config FILE] [--log-level LEVEL] <command>
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use triage_engine::agents::AGENT_ROLE;
use triage_engine::logging::setup_logging;
use triage_engine::prelude::*;
use triage_engine::{api, OpenAiClient};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Inbound call triage and routing", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route one caller utterance and print the outcome
    Route {
        /// Caller identifier, usually the phone number
        #[arg(long)]
        caller: String,
        /// What the caller said
        #[arg(long)]
        transcript: String,
        /// Use the keyword and word-list analyzers instead of the model
        #[arg(long)]
        offline: bool,
    },

    /// Manage the agent roster
    Agents {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Show a caller's history summary
    History {
        #[arg(long)]
        caller: String,
    },

    /// Run the HTTP API
    Serve {
        /// Listen address, defaults to the configured one
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// List the roster as routing sees it
    List,

    /// Add or update a roster entry
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Department the agent specializes in
        #[arg(long)]
        specialization: Option<String>,
        #[arg(long, default_value = AGENT_ROLE)]
        role: String,
    },

    /// Set the number of calls an agent is handling
    Calls {
        #[arg(long)]
        id: String,
        #[arg(long)]
        count: u32,
    },

    /// Remove a roster entry
    Remove {
        #[arg(long)]
        id: String,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_engine(
    config: &TriageConfig,
    database: Arc<TriageDatabase>,
    offline: bool,
) -> Result<TriageEngine> {
    let builder = TriageEngine::builder()
        .with_config(config)
        .with_store(database);

    let builder = if offline {
        info!("Using offline analyzers");
        builder.with_offline_analyzers()
    } else {
        let client = OpenAiClient::from_env(&config.openai)
            .context("model access needs an API key; pass --offline to run without one")?;
        info!("Using model {}", client.model());
        builder.with_openai(Arc::new(client), &config.openai)
    };

    Ok(builder.build()?)
}

/// Token cancelled on Ctrl-C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted");
            trigger.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TriageConfig::from_file(path)?,
        None => TriageConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    setup_logging(&config.logging)?;

    let database = Arc::new(TriageDatabase::from_config(&config.database).await?);

    match cli.command {
        Command::Route {
            caller,
            transcript,
            offline,
        } => {
            let engine = build_engine(&config, database.clone(), offline)?;
            let outcome = engine
                .route_with_cancellation(&RouteRequest::new(caller, transcript), &interrupt_token())
                .await
                .context("routing failed")?;
            print_json(&outcome)?;
        }

        Command::Agents { command } => match command {
            AgentCommand::List => {
                let engine = build_engine(&config, database.clone(), true)?;
                print_json(&engine.list_agents().await?)?;
            }
            AgentCommand::Add {
                id,
                name,
                specialization,
                role,
            } => {
                database
                    .upsert_agent(&id, &name, &role, specialization.as_deref())
                    .await?;
                print_json(&database.list_roster().await?)?;
            }
            AgentCommand::Calls { id, count } => {
                if !database.set_active_calls(&id, count).await? {
                    anyhow::bail!("No agent with id {}", id);
                }
            }
            AgentCommand::Remove { id } => {
                if !database.remove_agent(&id).await? {
                    anyhow::bail!("No agent with id {}", id);
                }
            }
        },

        Command::History { caller } => {
            let engine = build_engine(&config, database.clone(), true)?;
            print_json(&engine.fetch_history(&caller).await?)?;
        }

        Command::Serve { bind, offline } => {
            let engine = build_engine(&config, database.clone(), offline)?;
            let bind = bind.unwrap_or_else(|| config.server.bind_address.clone());
            api::serve(Arc::new(engine), &bind, interrupt_token()).await?;
        }
    }

    database.close().await;
    Ok(())
}
