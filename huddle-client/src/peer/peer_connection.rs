use crate::media::{MediaTrack, TrackKind};
use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

pub type SenderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// A track attached to the connection for sending.
#[derive(Debug, Clone)]
pub struct SenderInfo {
    pub id: SenderId,
    pub kind: TrackKind,
    /// `None` once the track was detached from the sender.
    pub track: Option<MediaTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Events raised by a connection's transport callbacks.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Local ICE candidate to trickle to the remote participant.
    CandidateGenerated(IceCandidate),
    StateChanged(PeerConnectionState),
    RemoteTrack(RemoteTrack),
}

/// One media connection to one remote participant.
///
/// `create_offer` and `create_answer` also install the result as the local
/// description.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;
    async fn create_answer(&self) -> Result<SessionDescription>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;
    async fn add_track(&self, track: MediaTrack) -> Result<SenderId>;
    async fn senders(&self) -> Vec<SenderInfo>;
    async fn remove_sender(&self, sender: SenderId) -> Result<()>;
    async fn replace_track(&self, sender: SenderId, track: Option<MediaTrack>) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Build a connection to `remote`. Transport events go to `events`.
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>>;
}
