use crate::media::{LocalTrack, MediaKind};
use crate::peer::RemoteTrack;
use crate::transport::peer_transport::{PeerTransport, ReplaceOutcome, TransportFactory};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::{LinkEvent, LinkId, TransportState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use meshcall_core::{IceCandidate, ParticipantId, SdpKind, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

impl From<RTCPeerConnectionState> for TransportState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Connecting => TransportState::Connecting,
            RTCPeerConnectionState::Connected => TransportState::Connected,
            RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
            RTCPeerConnectionState::Failed => TransportState::Failed,
            RTCPeerConnectionState::Closed => TransportState::Closed,
            _ => TransportState::New,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WebRtcTransportFactory {
    config: TransportConfig,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        link: LinkId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport = WebRtcTransport::new(link, self.config.clone(), events).await?;
        Ok(Box::new(transport))
    }
}

pub struct WebRtcTransport {
    pub remote_id: ParticipantId,
    pub peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<MediaKind, Arc<RTCRtpSender>>>,
}

impl WebRtcTransport {
    /// Инициализация нового WebRTC соединения с удалённым участником.
    /// event_tx: канал, в который транспорт "выплевывает" события для главного цикла сессии.
    pub async fn new(
        link: LinkId,
        config: TransportConfig,
        event_tx: mpsc::Sender<LinkEvent>,
    ) -> Result<Self> {
        // 1. Настройка MediaEngine (регистрация кодеков)
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Регистрация интерцепторов (NACK, RTCP отчеты)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 3. Конфигурация ICE серверов (STUN/TURN)
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // A. Мониторинг состояния соединения
        let state_tx = event_tx.clone();
        let uid_state = link.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer Connection State changed for {}: {:?}", uid, s);
                    let _ = tx.send(LinkEvent::StateChanged(uid, s.into())).await;
                })
            },
        ));

        // B. Trickle ICE: каждый локальный кандидат уходит участнику сразу
        let ice_tx = event_tx.clone();
        let uid_ice = link.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(LinkEvent::CandidateGenerated(uid, candidate))
                    .await;
            })
        }));

        // C. Входящие медиа-треки удалённого участника
        let track_tx = event_tx;
        let uid_track = link.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let uid = uid_track.clone();

            Box::pin(async move {
                debug!(
                    "Remote {:?} track '{}' from {}",
                    track.kind(),
                    track.id(),
                    uid
                );
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind: track.kind().into(),
                    rtp: Some(track),
                };
                let _ = tx.send(LinkEvent::RemoteTrack(uid, remote)).await;
            })
        }));

        Ok(Self {
            remote_id: link.remote_id,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
        })
    }

    async fn add_sender(&self, track: &LocalTrack) -> Result<Arc<RTCRtpSender>> {
        let sender = self.peer_connection.add_track(track.rtp_track()).await?;

        // RTCP нужно вычитывать, иначе интерцепторы не работают
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        Ok(sender)
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn attach_tracks(&self, tracks: &[LocalTrack]) -> Result<()> {
        let mut senders = self.senders.lock().await;
        for track in tracks {
            let sender = self.add_sender(track).await?;
            senders.insert(track.kind(), sender);
        }

        // Без своих треков всё равно хотим принимать медиа участника
        for kind in [MediaKind::Audio, MediaKind::Video] {
            if senders.contains_key(&kind) {
                continue;
            }
            self.peer_connection
                .add_transceiver_from_kind(
                    kind.into(),
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn replace_tracks(&self, tracks: &[LocalTrack]) -> Result<ReplaceOutcome> {
        let mut senders = self.senders.lock().await;
        let mut outcome = ReplaceOutcome::Replaced;

        for track in tracks {
            match senders.get(&track.kind()) {
                Some(sender) => sender.replace_track(Some(track.rtp_track())).await?,
                None => {
                    let sender = self.add_sender(track).await?;
                    senders.insert(track.kind(), sender);
                    outcome = ReplaceOutcome::RenegotiationNeeded;
                }
            }
        }

        for (kind, sender) in senders.iter() {
            if tracks.iter().all(|t| t.kind() != *kind) {
                sender.replace_track(None).await?;
            }
        }

        Ok(outcome)
    }

    /// Создать локальный SDP Offer и установить его как LocalDescription
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    /// Создать локальный SDP Answer и установить его как LocalDescription
    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    /// Применить удалённый SDP (Offer или Answer)
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    /// Добавить удалённого ICE-кандидата (Trickle ICE)
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    /// Закрыть WebRTC соединение
    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
