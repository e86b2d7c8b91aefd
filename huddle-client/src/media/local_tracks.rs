use crate::media::{LocalStream, MediaTrack, TrackKind};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared view of the local stream. Read by new peer sessions when they
/// attach senders, written by the media reconciler.
pub(crate) struct LocalTracks {
    stream: RwLock<Option<LocalStream>>,
    /// Audio track of the latest stream that had one; unmuting restores it
    /// on senders that lost their track.
    original_audio: RwLock<Option<MediaTrack>>,
    audio_enabled: AtomicBool,
    video_enabled: AtomicBool,
}

impl LocalTracks {
    pub(crate) fn new() -> Self {
        Self {
            stream: RwLock::new(None),
            original_audio: RwLock::new(None),
            audio_enabled: AtomicBool::new(true),
            video_enabled: AtomicBool::new(true),
        }
    }

    pub(crate) fn current(&self) -> Vec<MediaTrack> {
        self.stream
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.tracks().to_vec()))
            .unwrap_or_default()
    }

    pub(crate) fn stream(&self) -> Option<LocalStream> {
        self.stream.read().ok().and_then(|s| s.clone())
    }

    /// Install a new stream, returning the one it replaces.
    pub(crate) fn replace(&self, stream: LocalStream) -> Option<LocalStream> {
        if let Some(audio) = stream.audio_track()
            && let Ok(mut original) = self.original_audio.write()
        {
            *original = Some(audio.clone());
        }
        self.stream.write().ok().and_then(|mut s| s.replace(stream))
    }

    pub(crate) fn take(&self) -> Option<LocalStream> {
        self.stream.write().ok().and_then(|mut s| s.take())
    }

    pub(crate) fn original_audio(&self) -> Option<MediaTrack> {
        self.original_audio.read().ok().and_then(|t| t.clone())
    }

    pub(crate) fn is_enabled(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.audio_enabled.load(Ordering::SeqCst),
            TrackKind::Video => self.video_enabled.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn set_enabled(&self, kind: TrackKind, enabled: bool) {
        match kind {
            TrackKind::Audio => self.audio_enabled.store(enabled, Ordering::SeqCst),
            TrackKind::Video => self.video_enabled.store(enabled, Ordering::SeqCst),
        }
    }
}
