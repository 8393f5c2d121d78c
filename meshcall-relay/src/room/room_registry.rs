use axum::extract::ws::Message;
use dashmap::DashMap;
use meshcall_core::{ParticipantId, RelayFrame, RelayMessage, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Identifies one websocket connection. A user reconnecting gets a new one.
pub type ConnectionId = u64;

struct Member {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
}

type Room = HashMap<ParticipantId, Member>;

/// Все комнаты relay-сервера и их участники.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
    next_connection: Arc<AtomicU64>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for `user_id`, replacing any older one.
    ///
    /// The newcomer receives the `existing_users` roster before any other
    /// frame; an older connection of the same user is closed and announced
    /// as left.
    pub fn join(
        &self,
        room_id: &RoomId,
        user_id: &ParticipantId,
        tx: mpsc::UnboundedSender<Message>,
    ) -> ConnectionId {
        let connection = self.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
        let mut room = self.rooms.entry(room_id.clone()).or_default();

        if let Some(old) = room.remove(user_id) {
            info!(
                "User {} reconnected to room {}, replacing connection {}",
                user_id, room_id, old.connection
            );
            let _ = old.tx.send(Message::Close(None));
            let left = RelayFrame::new(
                user_id.clone(),
                RelayMessage::UserLeft {
                    user_id: user_id.clone(),
                },
            );
            broadcast(&room, user_id, &left);
        }

        let mut existing: Vec<ParticipantId> = room.keys().cloned().collect();
        if !existing.is_empty() {
            existing.sort();
            info!("Sending existing users {:?} to {}", existing, user_id);
            let roster = RelayFrame::from_relay(RelayMessage::ExistingUsers { users: existing });
            if let Some(msg) = to_message(&roster) {
                let _ = tx.send(msg);
            }
        }

        room.insert(user_id.clone(), Member { connection, tx });
        info!(
            "User {} joined room {} ({} connected)",
            user_id,
            room_id,
            room.len()
        );
        connection
    }

    /// Re-stamps `message` with the sender and forwards it: to `to_user_id`
    /// when present, otherwise to every other member.
    pub fn relay(
        &self,
        room_id: &RoomId,
        from: &ParticipantId,
        connection: ConnectionId,
        message: RelayMessage,
    ) {
        if let Err(reason) = check_origin(from, &message) {
            warn!("Dropping {} from {}: {}", message.kind(), from, reason);
            return;
        }

        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        if room.get(from).map(|m| m.connection) != Some(connection) {
            debug!("Dropping frame from stale connection {} of {}", connection, from);
            return;
        }

        let frame = RelayFrame::new(from.clone(), message);
        match frame.message.target() {
            Some(target) => match room.get(target) {
                Some(member) => {
                    if let Some(msg) = to_message(&frame) {
                        let _ = member.tx.send(msg);
                    }
                }
                None => warn!(
                    "Attempted to send {} to disconnected user {}",
                    frame.message.kind(),
                    target
                ),
            },
            None => {
                debug!(
                    "Broadcasting {} from {} in room {}",
                    frame.message.kind(),
                    from,
                    room_id
                );
                broadcast(&room, from, &frame);
            }
        }
    }

    /// Removes `user_id` if `connection` is still its current one, tells the
    /// remaining members and drops the room once empty.
    pub fn leave(&self, room_id: &RoomId, user_id: &ParticipantId, connection: ConnectionId) -> bool {
        let removed = {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                return false;
            };
            if room.get(user_id).map(|m| m.connection) != Some(connection) {
                return false;
            }
            room.remove(user_id);

            let left = RelayFrame::new(
                user_id.clone(),
                RelayMessage::UserLeft {
                    user_id: user_id.clone(),
                },
            );
            broadcast(&room, user_id, &left);
            true
        };

        info!("User {} removed from room {}", user_id, room_id);
        if self.rooms.remove_if(room_id, |_, room| room.is_empty()).is_some() {
            info!("Room {} cleaned up", room_id);
        }
        removed
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self
            .rooms
            .get(room_id)
            .map(|room| room.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Presence messages must describe their own sender; the roster is
/// relay-only.
fn check_origin(from: &ParticipantId, message: &RelayMessage) -> Result<(), &'static str> {
    match message {
        RelayMessage::UserJoined { user_id, .. } | RelayMessage::UserLeft { user_id }
            if user_id != from =>
        {
            Err("presence for another user")
        }
        RelayMessage::ExistingUsers { .. } => Err("roster is relay-only"),
        _ => Ok(()),
    }
}

fn broadcast(room: &Room, except: &ParticipantId, frame: &RelayFrame) {
    let Some(msg) = to_message(frame) else {
        return;
    };
    for (id, member) in room {
        if id != except && member.tx.send(msg.clone()).is_err() {
            warn!("Failed to broadcast to user {}", id);
        }
    }
}

fn to_message(frame: &RelayFrame) -> Option<Message> {
    match frame.encode() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to serialize relay frame: {}", e);
            None
        }
    }
}
