use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Input, Select};
use duet_client::{
    CallController, CallHandle, CallSnapshot, ClientConfig, IceServerConfig, LogRenderer,
    RoomId, RtcTransportFactory, SIGNALING_URL_ENV, SyntheticMediaSource,
    TransportConfig, WsSignalingChannel, lookup_room,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "duet", about = "Two-party calls over the duet signaling relay")]
struct Cli {
    /// Relay base URL, e.g. http://localhost:3000
    #[arg(long, global = true, env = SIGNALING_URL_ENV)]
    server: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the relay for a new room id.
    CreateRoom,

    /// Join a room and drive a call interactively.
    Call {
        #[arg(short, long)]
        room: Option<String>,

        #[arg(long, default_value_t = 30)]
        setup_timeout_secs: u64,

        /// STUN/TURN server URLs. Defaults to a public STUN server.
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let server = cli
        .server
        .with_context(|| format!("no relay configured: pass --server or set {SIGNALING_URL_ENV}"))?;

    match cli.command {
        Commands::CreateRoom => {
            let room_id = lookup_room(&server).await?;
            println!("{} {}", "Room created:".green().bold(), room_id);
        }
        Commands::Call {
            room,
            setup_timeout_secs,
            ice_servers,
        } => {
            let mut config = ClientConfig::with_signaling_url(server.as_str())?;
            config.call_setup_timeout = Duration::from_secs(setup_timeout_secs);
            if !ice_servers.is_empty() {
                config.transport = TransportConfig {
                    ice_servers: ice_servers.into_iter().map(IceServerConfig::stun).collect(),
                };
            }
            run_call(config, room).await?;
        }
    }

    Ok(())
}

async fn choose_room(server: &Url, room: Option<String>) -> Result<RoomId> {
    if let Some(room) = room {
        return Ok(RoomId::parse(&room)?);
    }

    let choice = tokio::task::spawn_blocking(|| {
        Select::new()
            .with_prompt("Room")
            .items(&["Create a new room", "Join an existing room"])
            .default(0)
            .interact()
    })
    .await??;

    if choice == 0 {
        let room_id = lookup_room(server).await?;
        println!("{} {}", "Room created:".green().bold(), room_id);
        return Ok(room_id);
    }

    let entered: String = tokio::task::spawn_blocking(|| {
        Input::new().with_prompt("Room id").interact_text()
    })
    .await??;
    Ok(RoomId::parse(&entered)?)
}

async fn run_call(config: ClientConfig, room: Option<String>) -> Result<()> {
    let room_id = choose_room(config.signaling_url()?, room).await?;

    let channel = WsSignalingChannel::connect(&config.websocket_url()?).await?;
    let (call, media) = CallController::start(
        room_id.clone(),
        &config,
        Box::new(channel),
        &SyntheticMediaSource::default(),
        Arc::new(RtcTransportFactory::new(config.transport.clone())),
        Box::new(LogRenderer::default()),
    )
    .await?;
    let silence = SyntheticMediaSource::spawn_silence(&media);
    println!("{} {}", "Joining room".cyan(), room_id.to_string().bold());

    let watcher = tokio::spawn(print_state_changes(call.clone()));
    let result = interact(&call).await;

    call.leave_room().await?;
    watcher.abort();
    silence.abort();
    println!("{}", "Left the room.".yellow());
    result
}

const ACTIONS: [&str; 4] = [
    "Start call",
    "Toggle microphone",
    "Toggle camera",
    "Leave room",
];

async fn interact(call: &CallHandle) -> Result<()> {
    loop {
        if call.snapshot().finished {
            return Ok(());
        }

        let choice = tokio::task::spawn_blocking(|| {
            Select::new()
                .with_prompt("Action")
                .items(&ACTIONS)
                .default(0)
                .interact()
        })
        .await??;

        match choice {
            0 => match call.start_call().await {
                Ok(()) => println!("{}", "Calling...".cyan()),
                Err(e) => println!("{} {}", "Cannot start call:".red(), e),
            },
            1 => {
                let on = call.toggle_microphone().await?;
                println!("Microphone {}", on_off(on));
            }
            2 => {
                let on = call.toggle_camera().await?;
                println!("Camera {}", on_off(on));
            }
            _ => return Ok(()),
        }
    }
}

fn on_off(on: bool) -> ColoredString {
    if on { "on".green() } else { "off".red() }
}

async fn print_state_changes(call: CallHandle) {
    let mut state = call.state();
    let mut last = state.borrow().clone();

    while state.changed().await.is_ok() {
        let snapshot = state.borrow_and_update().clone();
        report(&last, &snapshot);
        last = snapshot;
    }
}

fn report(previous: &CallSnapshot, current: &CallSnapshot) {
    if previous.local_id != current.local_id
        && let Some(id) = current.local_id
    {
        println!("{} {}", "Joined as".green(), id);
    }
    if previous.remote_id != current.remote_id {
        match current.remote_id {
            Some(id) => println!("{} {}", "Peer present:".green(), id),
            None => println!("{}", "Peer left the room.".yellow()),
        }
    }
    if previous.negotiation != current.negotiation {
        println!("Negotiation: {}", current.negotiation.to_string().bold());
    }
    if previous.health != current.health {
        println!("Connection: {}", current.health.to_string().bold());
    }
    if previous.last_error != current.last_error
        && let Some(e) = &current.last_error
    {
        println!("{} {}", "Error:".red().bold(), e);
    }
}
