//! Relationship Memory web client
//!
//! Entry point: serves the web UI by default, or runs a one-shot question or
//! a room join from the command line.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;

use relationship_memory_web::{
    ask::HttpAskClient,
    chat::exchange,
    config::{AppConfig, Cli, Command},
    room::{RoomCredentials, RoomError, RoomOptions, RoomSession, RoomState, SignalRoom},
    server, telemetry,
};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    telemetry::init();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load_with(&cli.global).context("failed to load configuration")?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::start_server(config).await,
        Command::Ask { question, company } => ask_once(&config, &question, company.as_deref()).await,
        Command::Room { identity, room } => {
            join_room(&config, identity.as_deref(), room.as_deref()).await
        }
    }
}

async fn ask_once(config: &AppConfig, question: &str, company: Option<&str>) -> anyhow::Result<()> {
    let client = HttpAskClient::new(
        config.ask.endpoint.clone(),
        config.ask.timeout_secs.map(Duration::from_secs),
    )?;
    let company = company
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(&config.chat.default_company_id);

    match exchange::ask_once(&client, company, question).await {
        Some(answer) => println!("{answer}"),
        None => eprintln!("Question is blank; nothing was asked."),
    }
    Ok(())
}

async fn join_room(config: &AppConfig, identity: Option<&str>, room: Option<&str>) -> anyhow::Result<()> {
    let server_url = config
        .room
        .server_url
        .clone()
        .ok_or(RoomError::MissingServerUrl)?;
    let credentials = RoomCredentials::from_config(&config.room).ok_or(RoomError::MissingCredentials)?;
    let issued = credentials.issue(identity, room)?;

    info!(
        name: "room.join.started",
        room = %issued.room,
        identity = %issued.identity,
        "Joining room"
    );

    let options = RoomOptions {
        adaptive_stream: config.room.adaptive_stream,
        dynacast: config.room.dynacast,
    };
    let session = RoomSession::mount(Arc::new(SignalRoom::new(options)), server_url, issued.token);
    let mut states = session.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match state {
                    RoomState::Connected => println!("connected to {}", issued.room),
                    RoomState::Failed(reason) => {
                        eprintln!("connection failed: {reason}");
                        break;
                    }
                    RoomState::Connecting | RoomState::Disconnected => {}
                }
            }
        }
    }

    session.unmount().await;
    Ok(())
}
