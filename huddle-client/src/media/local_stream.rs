use crate::media::{MediaTrack, TrackKind};

/// The set of locally captured tracks currently offered to peers.
#[derive(Debug, Clone, Default)]
pub struct LocalStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    pub fn audio_track(&self) -> Option<&MediaTrack> {
        self.tracks_of(TrackKind::Audio).next()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id() == track_id)
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}
