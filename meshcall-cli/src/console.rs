use colored::*;
use meshcall_client::{MessageOrigin, NegotiationState, RelayStatus, SessionEvent, SessionSnapshot};
use meshcall_core::ParticipantId;
use std::collections::HashMap;

/// Prints session events, remembering display names for later lines.
#[derive(Default)]
pub struct Console {
    names: HashMap<ParticipantId, String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn help() {
        println!("{}", "Type to chat. Commands:".bold());
        println!("  /mute     toggle microphone");
        println!("  /video    toggle camera");
        println!("  /restart  reopen capture devices");
        println!("  /who      list participants and links");
        println!("  /clear    clear local chat history");
        println!("  /leave    leave the room");
    }

    pub fn notice(&self, text: &str) {
        println!("{}", text.cyan());
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", text.red());
    }

    pub fn show(&mut self, event: &SessionEvent) {
        if let Some(line) = self.render(event) {
            println!("{}", line);
        }
    }

    fn name(&self, id: &ParticipantId) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn render(&mut self, event: &SessionEvent) -> Option<ColoredString> {
        let line = match event {
            SessionEvent::Status(status) => match status {
                RelayStatus::Connecting => "⏳ Connecting to relay...".yellow(),
                RelayStatus::Connected => "✅ Connected to relay".green(),
                RelayStatus::Lost => "⚠️ Relay connection lost".red().bold(),
                RelayStatus::Closed => "👋 Left the room".dimmed(),
            },
            SessionEvent::CaptureWarning(e) => {
                format!("⚠️ Joining without local media: {}", e).yellow()
            }
            SessionEvent::LocalMediaChanged(media) => format!(
                "🎛️ Local media: {} track(s), audio {}, video {}",
                media.track_count,
                on_off(media.audio_enabled),
                on_off(media.video_enabled)
            )
            .dimmed(),
            SessionEvent::ParticipantJoined(p) => {
                self.names.insert(p.id.clone(), p.display_name.clone());
                if p.is_self {
                    format!("🙋 You are {} ({})", p.display_name, p.id).green()
                } else {
                    format!("➕ {} joined", p.display_name).green()
                }
            }
            SessionEvent::ParticipantLeft(id) => {
                let line = format!("➖ {} left", self.name(id)).yellow();
                self.names.remove(id);
                line
            }
            SessionEvent::ParticipantUnreachable { id, reason } => {
                format!("❌ Lost media link with {}: {}", self.name(id), reason).red()
            }
            SessionEvent::NegotiationChanged { id, state } => match state {
                NegotiationState::Negotiated => {
                    format!("🔗 Media link with {} established", self.name(id)).green()
                }
                NegotiationState::Closed => {
                    format!("🔗 Media link with {} closed", self.name(id)).dimmed()
                }
                _ => return None,
            },
            SessionEvent::RemoteStream { id, stream } => format!(
                "📺 Receiving {} track(s) from {}",
                stream.tracks().len(),
                self.name(id)
            )
            .normal(),
            SessionEvent::RemoteStreamRemoved(_) => return None,
            SessionEvent::Chat(msg) => match msg.origin {
                MessageOrigin::Local => format!("{}: {}", "you".cyan().bold(), msg.text).normal(),
                MessageOrigin::Remote => {
                    format!("{}: {}", msg.sender_name.bold(), msg.text).normal()
                }
            },
            SessionEvent::ChatCleared => "🧹 Chat cleared".dimmed(),
        };
        Some(line)
    }

    pub fn roster(&self, snapshot: &SessionSnapshot) {
        println!(
            "{}",
            format!("👥 {} participant(s)", snapshot.participants.len()).bold()
        );
        for p in &snapshot.participants {
            let mut line = format!("  {} ({})", p.display_name, p.id);
            if p.is_self {
                line.push_str(" [you]");
            }
            if p.is_host {
                line.push_str(" [host]");
            }
            if let Some(link) = snapshot.link(&p.id) {
                line.push_str(&format!(
                    " link={:?}{}",
                    link.state,
                    if link.has_remote_stream { " streaming" } else { "" }
                ));
            } else if !p.reachable {
                line.push_str(" unreachable");
            }
            println!("{}", line);
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
