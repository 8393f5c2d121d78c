use crate::chat::ChatRelay;
use crate::config::SessionConfig;
use crate::error::{NegotiationError, RelayLinkError};
use crate::media::{CaptureController, MediaDevices, RestartOutcome};
use crate::membership::{Membership, Participant, Sighting};
use crate::peer::{NegotiationState, PeerLinkTable};
use crate::relay::{RelayConnector, RelayLink};
use crate::session::session_command::SessionCommand;
use crate::session::session_event::{RelayStatus, SessionEvent, SessionSnapshot};
use crate::session::session_handle::SessionHandle;
use crate::transport::{LinkEvent, TransportFactory, TransportState};
use meshcall_core::{ParticipantId, RelayFrame, RelayMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Collaborators a session is built from.
#[derive(Clone)]
pub struct SessionDeps {
    pub devices: Arc<dyn MediaDevices>,
    pub relay: Arc<dyn RelayConnector>,
    pub transports: Arc<dyn TransportFactory>,
}

/// Входы, которые сессия планирует сама себе (таймеры, фоновые задачи).
#[derive(Debug)]
enum Internal {
    Announce,
    Initiate(ParticipantId),
    CaptureRestarted(RestartOutcome),
}

/// One participant's presence in one room.
///
/// All session state is owned by a single task; commands, relay frames,
/// transport callbacks and timers are funnelled into it over channels.
pub struct RoomSession {
    config: SessionConfig,
    capture: CaptureController,
    relay: RelayLink,
    relay_rx: Option<mpsc::UnboundedReceiver<RelayFrame>>,
    relay_status: RelayStatus,
    membership: Membership,
    links: PeerLinkTable,
    chat: ChatRelay,
    command_rx: mpsc::Receiver<SessionCommand>,
    link_rx: mpsc::Receiver<LinkEvent>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl RoomSession {
    /// Acquires local media, opens the relay link and starts the session
    /// task.
    ///
    /// Capture failure only produces a `CaptureWarning`. Failure to open the
    /// relay is fatal and releases whatever was captured.
    pub async fn join(
        config: SessionConfig,
        deps: SessionDeps,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), RelayLinkError> {
        let (events, events_rx) = mpsc::unbounded_channel();
        let _ = events.send(SessionEvent::Status(RelayStatus::Connecting));

        let mut capture = CaptureController::new(deps.devices, config.constraints.clone());
        let acquired = capture.acquire(config.constraints.clone()).await;
        if let Some(warning) = acquired.warning {
            let _ = events.send(SessionEvent::CaptureWarning(warning));
        }
        let _ = events.send(SessionEvent::LocalMediaChanged(acquired.media.summary()));

        let (relay, relay_rx) =
            match RelayLink::connect(deps.relay.as_ref(), &config.room_id, &config.self_id).await {
                Ok(opened) => opened,
                Err(e) => {
                    error!("Could not join room {}: {}", config.room_id, e);
                    capture.release();
                    return Err(e);
                }
            };
        let _ = events.send(SessionEvent::Status(RelayStatus::Connected));

        let local = Participant::local(
            config.self_id.clone(),
            config.display_name.clone(),
            config.is_host,
        );
        let _ = events.send(SessionEvent::ParticipantJoined(local.clone()));

        let (link_tx, link_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let links = PeerLinkTable::new(
            config.self_id.clone(),
            deps.transports,
            Arc::new(relay.clone()),
            link_tx,
        );

        let session = Self {
            membership: Membership::new(local, config.initiation),
            chat: ChatRelay::new(config.self_id.clone(), config.display_name.clone()),
            capture,
            relay,
            relay_rx: Some(relay_rx),
            relay_status: RelayStatus::Connected,
            links,
            command_rx,
            link_rx,
            internal_tx,
            internal_rx,
            events,
            config,
        };
        session.schedule(session.config.announce_delay, Internal::Announce);

        let handle = SessionHandle::new(session.config.self_id.clone(), command_tx);
        tokio::spawn(session.run());

        Ok((handle, events_rx))
    }

    async fn run(mut self) {
        info!(
            "Session event loop started for {} in room {}",
            self.config.self_id, self.config.room_id
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("All session handles dropped. Leaving room.");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                frame = next_frame(&mut self.relay_rx) => {
                    match frame {
                        Some(f) => self.handle_frame(f).await,
                        None => self.relay_lost(),
                    }
                }

                Some(evt) = self.link_rx.recv() => self.handle_link_event(evt).await,

                Some(input) = self.internal_rx.recv() => self.handle_internal(input).await,
            }
        }

        info!("Session event loop finished for {}", self.config.self_id);
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event dropped: no listener");
        }
    }

    /// Delivers `input` to the loop after `delay`; a zero delay skips the
    /// timer.
    fn schedule(&self, delay: Duration, input: Internal) {
        if delay.is_zero() {
            let _ = self.internal_tx.send(input);
            return;
        }
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(input);
        });
    }

    /// Returns `false` once the session is over.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::ToggleAudio { reply } => {
                let enabled = self.capture.toggle_audio();
                self.emit(SessionEvent::LocalMediaChanged(self.capture.media().summary()));
                let _ = reply.send(enabled);
            }

            SessionCommand::ToggleVideo { reply } => {
                let enabled = self.capture.toggle_video();
                self.emit(SessionEvent::LocalMediaChanged(self.capture.media().summary()));
                let _ = reply.send(enabled);
            }

            SessionCommand::RestartCapture { constraints, reply } => {
                let ticket = self.capture.begin_restart(constraints);
                let generation = ticket.generation();
                self.emit(SessionEvent::LocalMediaChanged(self.capture.media().summary()));

                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let outcome = ticket.run().await;
                    let _ = tx.send(Internal::CaptureRestarted(outcome));
                });
                let _ = reply.send(generation);
            }

            SessionCommand::SendChat { text, reply } => match self.chat.compose(&text) {
                Some((frame, message)) => {
                    let _ = self.relay.send(frame);
                    self.emit(SessionEvent::Chat(message.clone()));
                    let _ = reply.send(Some(message));
                }
                None => {
                    debug!("Ignoring blank chat message");
                    let _ = reply.send(None);
                }
            },

            SessionCommand::ClearChat => {
                self.chat.clear();
                self.emit(SessionEvent::ChatCleared);
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            SessionCommand::Leave { done } => {
                self.shutdown().await;
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    async fn handle_frame(&mut self, frame: RelayFrame) {
        let Some(frame) = self.relay.accept(frame) else {
            return;
        };
        let RelayFrame {
            from_user_id,
            message,
        } = frame;

        match message {
            RelayMessage::UserJoined { user_id, user_name } => {
                self.admit(&user_id, user_name, Sighting::Joined);
            }

            RelayMessage::ExistingUsers { users } => {
                for user_id in users {
                    self.admit(&user_id, None, Sighting::Roster);
                }
            }

            RelayMessage::UserLeft { user_id } => {
                self.remove_participant(&user_id).await;
            }

            RelayMessage::ChatMessage {
                message,
                timestamp,
                user_name,
            } => {
                let Some(from) = from_user_id else {
                    warn!("Dropping chat message without sender");
                    return;
                };
                let message = self.chat.receive(from, message, timestamp, user_name);
                self.emit(SessionEvent::Chat(message));
            }

            RelayMessage::Offer { offer, to_user_id } => {
                let Some(from) = self.negotiation_sender(from_user_id, &to_user_id, "offer") else {
                    return;
                };
                let result = self
                    .links
                    .handle_offer(&from, offer, self.capture.media())
                    .await;
                self.settle(&from, result);
            }

            RelayMessage::Answer {
                answer,
                to_user_id,
            } => {
                let Some(from) = self.negotiation_sender(from_user_id, &to_user_id, "answer") else {
                    return;
                };
                let result = self.links.handle_answer(&from, answer).await;
                self.settle(&from, result);
            }

            RelayMessage::IceCandidate {
                candidate,
                to_user_id,
            } => {
                let Some(from) = self.negotiation_sender(from_user_id, &to_user_id, "ice-candidate")
                else {
                    return;
                };
                let result = self
                    .links
                    .handle_remote_candidate(&from, candidate)
                    .await
                    .map(|()| None);
                self.settle(&from, result);
            }
        }
    }

    /// Checks addressing of a negotiation frame and admits an unknown sender.
    fn negotiation_sender(
        &mut self,
        from: Option<ParticipantId>,
        to: &ParticipantId,
        kind: &str,
    ) -> Option<ParticipantId> {
        if *to != self.config.self_id {
            debug!("Ignoring {} addressed to {}", kind, to);
            return None;
        }
        let Some(from) = from else {
            warn!("Dropping {} without sender", kind);
            return None;
        };
        if self.membership.is_departed(&from) {
            debug!("Dropping {} from departed {}", kind, from);
            return None;
        }
        self.admit(&from, None, Sighting::Negotiation);
        Some(from)
    }

    fn admit(&mut self, id: &ParticipantId, name: Option<String>, via: Sighting) {
        let Some(admission) = self.membership.sighted(id, name, via) else {
            return;
        };
        self.emit(SessionEvent::ParticipantJoined(admission.participant));
        if admission.initiate {
            self.schedule(self.config.offer_delay, Internal::Initiate(id.clone()));
        }
    }

    async fn remove_participant(&mut self, id: &ParticipantId) {
        let removed = self.membership.left(id);
        let had_link = self.links.close(id).await;
        if had_link {
            self.emit(SessionEvent::NegotiationChanged {
                id: id.clone(),
                state: NegotiationState::Closed,
            });
            self.emit(SessionEvent::RemoteStreamRemoved(id.clone()));
        }
        if removed.is_some() {
            self.emit(SessionEvent::ParticipantLeft(id.clone()));
        }
    }

    /// Publishes the outcome of a negotiation step for `id`.
    fn settle(
        &mut self,
        id: &ParticipantId,
        result: Result<Option<NegotiationState>, NegotiationError>,
    ) {
        match result {
            Ok(None) => {}
            Ok(Some(state)) => {
                if state == NegotiationState::Negotiated {
                    self.membership.set_reachable(id, true);
                }
                self.emit(SessionEvent::NegotiationChanged {
                    id: id.clone(),
                    state,
                });
            }
            Err(e) => {
                self.emit(SessionEvent::NegotiationChanged {
                    id: id.clone(),
                    state: NegotiationState::Closed,
                });
                self.emit(SessionEvent::RemoteStreamRemoved(id.clone()));
                if self.membership.set_reachable(id, false).is_some() {
                    self.emit(SessionEvent::ParticipantUnreachable {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::CandidateGenerated(link, candidate) => {
                self.links.send_local_candidate(&link, candidate).await;
            }

            LinkEvent::RemoteTrack(link, track) => match self.links.add_remote_track(&link, track) {
                Some(stream) => self.emit(SessionEvent::RemoteStream {
                    id: link.remote_id,
                    stream,
                }),
                None => debug!("Remote track for stale link {}", link),
            },

            LinkEvent::StateChanged(link, TransportState::Failed) => {
                if !self.links.is_current(&link) {
                    debug!("Ignoring failure of stale link {}", link);
                    return;
                }
                let id = link.remote_id;
                let err = self.links.fail(&id, NegotiationError::TransportFailed).await;
                self.settle(&id, Err(err));
            }

            LinkEvent::StateChanged(link, state) => {
                debug!("Transport {} is {:?}", link, state);
            }
        }
    }

    async fn handle_internal(&mut self, input: Internal) {
        match input {
            Internal::Announce => {
                let announce = RelayMessage::UserJoined {
                    user_id: self.config.self_id.clone(),
                    user_name: Some(self.config.display_name.clone()),
                };
                if self.relay.send(announce).is_ok() {
                    info!("Announced {} to room {}", self.config.self_id, self.config.room_id);
                }
            }

            Internal::Initiate(id) => {
                if !self.membership.take_initiation(&id) {
                    debug!("Initiation toward {} no longer wanted", id);
                    return;
                }
                let result = self.links.initiate(&id, self.capture.media()).await;
                self.settle(&id, result);
            }

            Internal::CaptureRestarted(outcome) => {
                let Some(acquired) = self.capture.complete_restart(outcome) else {
                    return;
                };
                if let Some(warning) = acquired.warning {
                    self.emit(SessionEvent::CaptureWarning(warning));
                }
                self.emit(SessionEvent::LocalMediaChanged(acquired.media.summary()));

                for (id, result) in self.links.replace_tracks(&acquired.media).await {
                    self.settle(&id, result);
                }
            }
        }
    }

    /// The inbound relay stream ended. Remote participants are forgotten;
    /// established PeerLinks stay up until they fail on their own.
    fn relay_lost(&mut self) {
        warn!("Relay link lost for {}", self.config.self_id);
        self.relay_rx = None;
        self.relay.close();
        self.relay_status = RelayStatus::Lost;
        self.emit(SessionEvent::Status(RelayStatus::Lost));

        for id in self.membership.retain_self() {
            self.emit(SessionEvent::ParticipantLeft(id));
        }
    }

    async fn shutdown(&mut self) {
        if self.relay.is_open() {
            let _ = self.relay.send(RelayMessage::UserLeft {
                user_id: self.config.self_id.clone(),
            });
        }
        self.links.close_all().await;
        self.capture.release();
        self.relay.close();
        self.relay_rx = None;
        self.relay_status = RelayStatus::Closed;
        self.emit(SessionEvent::Status(RelayStatus::Closed));
        info!("{} left room {}", self.config.self_id, self.config.room_id);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            participants: self.membership.participants(),
            links: self.links.snapshot(),
            local_media: self.capture.media().summary(),
            chat: self.chat.messages().to_vec(),
            relay: self.relay_status,
        }
    }
}

async fn next_frame(rx: &mut Option<mpsc::UnboundedReceiver<RelayFrame>>) -> Option<RelayFrame> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
