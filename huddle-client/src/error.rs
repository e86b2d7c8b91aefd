use crate::media::TrackKind;
use huddle_core::RoomId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("room {0} is not active")]
    RoomInactive(RoomId),

    #[error("only the room host may {0}")]
    NotHost(&'static str),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("signaling channel is closed")]
    Closed,
}

/// Failure to obtain local capture. Existing sessions are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("permission to use the {0} was denied")]
    PermissionDenied(TrackKind),

    #[error("no {0} device is available")]
    DeviceUnavailable(TrackKind),

    #[error("capture failed: {0}")]
    Capture(String),
}
