use crate::error::MediaError;
use crate::media::LocalStream;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Capture backend: microphone, camera, screen, or a test generator.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open(&self, constraints: MediaConstraints) -> Result<LocalStream, MediaError>;
}
