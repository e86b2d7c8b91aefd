use crate::error::MediaError;
use crate::media::{LocalStream, LocalTracks, MediaConstraints, MediaSource, TrackKind};
use crate::peer::PeerSessionManager;
use crate::signaling::SignalingOutput;
use huddle_core::{ParticipantId, SignalMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps every peer session's senders consistent with the local stream
/// and with the local mute/camera choices.
#[derive(Clone)]
pub struct LocalMedia {
    participant_id: ParticipantId,
    local: Arc<LocalTracks>,
    sessions: PeerSessionManager,
    output: Arc<dyn SignalingOutput>,
}

impl LocalMedia {
    /// Shares the local stream with the sessions of `sessions`.
    pub fn new(sessions: PeerSessionManager, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            participant_id: sessions.local_id().clone(),
            local: sessions.local_tracks(),
            sessions,
            output,
        }
    }

    /// Open capture and publish it to every session. On failure nothing
    /// changes and existing sessions keep whatever they were sending.
    pub async fn acquire(
        &self,
        source: &dyn MediaSource,
        constraints: MediaConstraints,
    ) -> Result<(), MediaError> {
        let stream = source.open(constraints).await.inspect_err(|e| {
            warn!(participant = %self.participant_id, "Failed to acquire local media: {}", e);
        })?;
        self.replace_stream(stream).await;
        Ok(())
    }

    /// Swap the local stream and bring every session's senders in line
    /// with it. Senders whose tracks are gone are removed, new tracks are
    /// added; the connections are not renegotiated.
    pub async fn replace_stream(&self, stream: LocalStream) {
        for track in stream.tracks() {
            track.set_enabled(self.local.is_enabled(track.kind()));
        }

        info!(
            participant = %self.participant_id,
            stream = stream.id(),
            tracks = stream.tracks().len(),
            "Local stream replaced"
        );
        let tracks = stream.tracks().to_vec();
        let previous = self.local.replace(stream);

        self.sessions.sync_tracks(tracks.clone()).await;

        // The retained audio track outlives the stream it came from.
        let original = self.local.original_audio();
        if let Some(previous) = previous {
            for track in previous.tracks() {
                let kept = tracks.iter().any(|t| t.same_track(track))
                    || original.as_ref().is_some_and(|o| o.same_track(track));
                if !kept {
                    track.stop();
                }
            }
        }
    }

    /// Mute or unmute. Every session applies the change before the new
    /// state is announced to the room.
    pub async fn set_audio_enabled(&self, enabled: bool) {
        self.local.set_enabled(TrackKind::Audio, enabled);
        if let Some(stream) = self.local.stream() {
            for track in stream.tracks_of(TrackKind::Audio) {
                track.set_enabled(enabled);
            }
        }

        let original = self.local.original_audio();
        if enabled && let Some(original) = &original {
            original.set_enabled(true);
        }
        self.sessions.set_audio(enabled, original).await;

        let announced = self.output.send(SignalMessage::AudioToggle {
            from: self.participant_id.clone(),
            audio_enabled: enabled,
        });
        if !announced {
            debug!(participant = %self.participant_id, "Audio state not announced, channel not open");
        }
        info!(participant = %self.participant_id, enabled, "Local audio toggled");
    }

    /// Video is toggled on the local tracks only.
    pub fn set_video_enabled(&self, enabled: bool) {
        self.local.set_enabled(TrackKind::Video, enabled);
        if let Some(stream) = self.local.stream() {
            for track in stream.tracks_of(TrackKind::Video) {
                track.set_enabled(enabled);
            }
        }
        info!(participant = %self.participant_id, enabled, "Local video toggled");
    }

    pub fn audio_enabled(&self) -> bool {
        self.local.is_enabled(TrackKind::Audio)
    }

    pub fn video_enabled(&self) -> bool {
        self.local.is_enabled(TrackKind::Video)
    }

    pub fn stream(&self) -> Option<LocalStream> {
        self.local.stream()
    }

    /// Release every captured track.
    pub fn stop(&self) {
        if let Some(stream) = self.local.take() {
            stream.stop();
        }
        if let Some(original) = self.local.original_audio() {
            original.stop();
        }
    }
}
