use crate::media::{MediaTrack, TrackKind};
use crate::peer::{
    PeerConnection, PeerConnectionFactory, PeerConnectionState, PeerEvent, RemoteTrack, SenderId,
    SenderInfo,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, ParticipantId, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
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
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`RtcPeerConnection`]s sharing one ICE configuration.
pub struct RtcConnectionFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcConnectionFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl PeerConnectionFactory for RtcConnectionFactory {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let connection = RtcPeerConnection::new(remote.clone(), &self.ice_servers, events).await?;
        Ok(Arc::new(connection))
    }
}

struct RtcSender {
    id: SenderId,
    kind: TrackKind,
    sender: Arc<RTCRtpSender>,
    track: Option<MediaTrack>,
}

/// [`PeerConnection`] backed by webrtc-rs.
pub struct RtcPeerConnection {
    remote: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<Vec<RtcSender>>,
    next_sender: AtomicU64,
}

impl RtcPeerConnection {
    /// Transport callbacks report into `events`.
    pub async fn new(
        remote: ParticipantId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = events.clone();
        let remote_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let remote = remote_state.clone();

                Box::pin(async move {
                    debug!(remote = %remote, "RTC peer connection state: {}", s);
                    let _ = tx.send(PeerEvent::StateChanged(map_state(s))).await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(PeerEvent::CandidateGenerated(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    }))
                    .await;
            })
        }));

        let track_tx = events;
        let remote_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let remote = remote_track.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    info!(remote = %remote, track = %track.id(), ?kind, "Remote track started");
                    let _ = tx
                        .send(PeerEvent::RemoteTrack(RemoteTrack {
                            id: track.id(),
                            stream_id: track.stream_id(),
                            kind,
                        }))
                        .await;
                })
            },
        ));

        Ok(Self {
            remote,
            peer_connection,
            senders: Mutex::new(Vec::new()),
            next_sender: AtomicU64::new(1),
        })
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }
}

#[async_trait]
impl PeerConnection for RtcPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("remote description rejected")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn add_track(&self, track: MediaTrack) -> Result<SenderId> {
        let sender = self.peer_connection.add_track(track.rtc_track()).await?;

        // RTCP has to be drained for interceptors such as NACK to work.
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        let id = self.next_sender.fetch_add(1, Ordering::Relaxed);
        self.senders.lock().await.push(RtcSender {
            id,
            kind: track.kind(),
            sender,
            track: Some(track),
        });
        Ok(id)
    }

    async fn senders(&self) -> Vec<SenderInfo> {
        self.senders
            .lock()
            .await
            .iter()
            .map(|s| SenderInfo {
                id: s.id,
                kind: s.kind,
                track: s.track.clone(),
            })
            .collect()
    }

    async fn remove_sender(&self, sender: SenderId) -> Result<()> {
        let mut senders = self.senders.lock().await;
        let index = senders
            .iter()
            .position(|s| s.id == sender)
            .ok_or_else(|| anyhow!("unknown sender {}", sender))?;
        self.peer_connection
            .remove_track(&senders[index].sender)
            .await?;
        senders.remove(index);
        Ok(())
    }

    async fn replace_track(&self, sender: SenderId, track: Option<MediaTrack>) -> Result<()> {
        let mut senders = self.senders.lock().await;
        let entry = senders
            .iter_mut()
            .find(|s| s.id == sender)
            .ok_or_else(|| anyhow!("unknown sender {}", sender))?;
        entry
            .sender
            .replace_track(track.as_ref().map(|t| t.rtc_track()))
            .await?;
        entry.track = track;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn map_state(state: RTCPeerConnectionState) -> PeerConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => PeerConnectionState::New,
    }
}
