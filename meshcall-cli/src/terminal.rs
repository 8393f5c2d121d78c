use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use meshcall_client::{
    MediaConstraints, RelayStatus, RoomSession, SessionConfig, SessionDeps, SessionEvent,
    SessionHandle, SyntheticDevices, TransportConfig, WebRtcTransportFactory, WsRelayConnector,
};
use meshcall_core::{IceServerConfig, ParticipantId};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::info;

use crate::console::Console;

#[derive(clap::Args)]
pub struct JoinArgs {
    /// Relay base address
    #[arg(long, default_value = "ws://127.0.0.1:8000")]
    relay: String,

    #[arg(long)]
    room: String,

    /// Display name; asked interactively when omitted
    #[arg(long)]
    name: Option<String>,

    /// Participant id; random when omitted
    #[arg(long)]
    id: Option<String>,

    #[arg(long)]
    host: bool,

    /// Join without camera and microphone
    #[arg(long)]
    no_media: bool,

    #[arg(long, conflicts_with = "no_media")]
    audio_only: bool,

    /// Extra STUN server, repeatable
    #[arg(long = "stun")]
    stun: Vec<String>,
}

/// One line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum InputLine {
    Chat(String),
    Mute,
    Video,
    Restart,
    Who,
    Clear,
    Leave,
    Help,
    Unknown(String),
    Empty,
}

fn parse_line(line: &str) -> InputLine {
    let line = line.trim();
    if line.is_empty() {
        return InputLine::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return InputLine::Chat(line.to_owned());
    };
    match command.split_whitespace().next().unwrap_or_default() {
        "mute" => InputLine::Mute,
        "video" => InputLine::Video,
        "restart" => InputLine::Restart,
        "who" => InputLine::Who,
        "clear" => InputLine::Clear,
        "leave" | "quit" => InputLine::Leave,
        "help" => InputLine::Help,
        other => InputLine::Unknown(other.to_owned()),
    }
}

enum Outcome {
    Left,
    RelayLost,
}

type StdinLines = Lines<BufReader<Stdin>>;

pub async fn run(args: JoinArgs) -> Result<()> {
    let name = match args.name.clone() {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .interact_text()
            .context("Failed to read display name")?,
    };
    let self_id = args
        .id
        .clone()
        .map(ParticipantId::from)
        .unwrap_or_else(ParticipantId::random);

    let constraints = if args.audio_only {
        MediaConstraints::audio_only()
    } else {
        MediaConstraints::default()
    };
    let config = SessionConfig::new(args.room.as_str(), self_id, name)
        .host(args.host)
        .constraints(constraints);
    let deps = session_deps(&args);

    // Prompts after this point read through `input` so only one reader owns stdin
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut console = Console::new();

    loop {
        println!(
            "{}",
            format!("🔌 Joining room {} as {}", config.room_id, config.self_id).cyan()
        );

        let joined = RoomSession::join(config.clone(), deps.clone()).await;
        let (handle, mut events) = match joined {
            Ok(session) => session,
            Err(e) => {
                console.error(&format!("Could not reach the relay: {}", e));
                if ask_retry(&mut input).await? {
                    continue;
                }
                return Ok(());
            }
        };
        Console::help();

        match drive(&handle, &mut events, &mut input, &mut console).await? {
            Outcome::Left => {
                // Drain the remaining teardown events
                while let Some(event) = events.recv().await {
                    console.show(&event);
                }
                return Ok(());
            }
            Outcome::RelayLost => {
                let _ = handle.leave().await;
                if !ask_retry(&mut input).await? {
                    return Ok(());
                }
                info!("Rejoining room {}", config.room_id);
            }
        }
    }
}

fn session_deps(args: &JoinArgs) -> SessionDeps {
    let devices = if args.no_media {
        SyntheticDevices::unavailable()
    } else {
        SyntheticDevices::new()
    };

    let mut transport = TransportConfig::default();
    transport
        .ice_servers
        .extend(args.stun.iter().map(|url| IceServerConfig::stun(url.as_str())));

    SessionDeps {
        devices: Arc::new(devices),
        relay: Arc::new(WsRelayConnector::new(args.relay.as_str())),
        transports: Arc::new(WebRtcTransportFactory::new(transport)),
    }
}

async fn drive(
    handle: &SessionHandle,
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    input: &mut StdinLines,
    console: &mut Console,
) -> Result<Outcome> {
    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    let _ = handle.leave().await;
                    return Ok(Outcome::Left);
                };
                if !execute(handle, parse_line(&line), console).await? {
                    return Ok(Outcome::Left);
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    return Ok(Outcome::Left);
                };
                console.show(&event);
                if matches!(event, SessionEvent::Status(RelayStatus::Lost)) {
                    return Ok(Outcome::RelayLost);
                }
            }
        }
    }
}

/// Returns `false` once the user left.
async fn execute(handle: &SessionHandle, line: InputLine, console: &mut Console) -> Result<bool> {
    match line {
        InputLine::Chat(text) => {
            handle.send_chat(text).await?;
        }
        InputLine::Mute => {
            let on = handle.toggle_audio().await?;
            console.notice(if on { "🎙️ Microphone on" } else { "🔇 Microphone muted" });
        }
        InputLine::Video => {
            let on = handle.toggle_video().await?;
            console.notice(if on { "📷 Camera on" } else { "🚫 Camera off" });
        }
        InputLine::Restart => {
            let generation = handle.restart_capture(None).await?;
            console.notice(&format!("🔄 Restarting capture (generation {})", generation));
        }
        InputLine::Who => {
            let snapshot = handle.snapshot().await?;
            console.roster(&snapshot);
        }
        InputLine::Clear => handle.clear_chat().await?,
        InputLine::Leave => {
            handle.leave().await?;
            return Ok(false);
        }
        InputLine::Help => Console::help(),
        InputLine::Unknown(command) => {
            console.error(&format!("Unknown command /{}, try /help", command));
        }
        InputLine::Empty => {}
    }
    Ok(true)
}

async fn ask_retry(input: &mut StdinLines) -> Result<bool> {
    println!("{}", "Rejoin the room? [Y/n]".yellow().bold());
    let answer = input.next_line().await.context("Failed to read stdin")?;
    Ok(match answer {
        None => false,
        Some(answer) => !matches!(answer.trim().to_lowercase().as_str(), "n" | "no"),
    })
}
