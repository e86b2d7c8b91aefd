use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("microphone"),
            TrackKind::Video => f.write_str("camera"),
        }
    }
}

/// A locally captured track. Clones share one underlying track, so
/// disabling it through any clone silences every sender it is attached to.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

struct TrackInner {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    rtc: Arc<TrackLocalStaticSample>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        let id = id.into();
        let mime_type = match kind {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        let rtc = TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            id.clone(),
            stream_id.into(),
        );

        Self {
            inner: Arc::new(TrackInner {
                id,
                kind,
                enabled: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
                rtc: Arc::new(rtc),
            }),
        }
    }

    pub fn audio(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self::new(TrackKind::Audio, id, stream_id)
    }

    pub fn video(id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self::new(TrackKind::Video, id, stream_id)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Release the capture. A stopped track never produces samples again.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    /// Same underlying track, regardless of which clone.
    pub fn same_track(&self, other: &MediaTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn rtc_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.inner.rtc.clone()
    }

    /// Feed one encoded frame from the capture device. Frames written while
    /// the track is disabled or stopped are discarded.
    pub async fn write_sample(&self, sample: &Sample) -> Result<()> {
        if !self.is_enabled() || self.is_stopped() {
            return Ok(());
        }
        self.inner.rtc.write_sample(sample).await?;
        Ok(())
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
