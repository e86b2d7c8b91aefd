use crate::peer::{PeerConnectionState, RemoteTrack};
use huddle_core::ParticipantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    New,
    OfferSent,
    AnswerSent,
    Connected,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

/// Observable state of one peer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub remote_id: ParticipantId,
    pub phase: SessionPhase,
    pub connection_state: PeerConnectionState,
    pub remote_description_applied: bool,
    pub pending_candidates: usize,
    /// Set by the local host's moderation action.
    pub moderation_muted: bool,
    /// Last value the remote participant announced.
    pub remote_audio_enabled: bool,
    pub remote_stream: Option<RemoteStream>,
}

impl SessionSnapshot {
    pub fn new(remote_id: ParticipantId) -> Self {
        Self {
            remote_id,
            phase: SessionPhase::New,
            connection_state: PeerConnectionState::New,
            remote_description_applied: false,
            pending_candidates: 0,
            moderation_muted: false,
            remote_audio_enabled: true,
            remote_stream: None,
        }
    }

    pub(crate) fn add_remote_track(&mut self, track: RemoteTrack) {
        if let Some(stream) = self
            .remote_stream
            .as_mut()
            .filter(|s| s.id == track.stream_id)
        {
            stream.tracks.retain(|t| t.id != track.id);
            stream.tracks.push(track);
            return;
        }

        self.remote_stream = Some(RemoteStream {
            id: track.stream_id.clone(),
            tracks: vec![track],
        });
    }
}
