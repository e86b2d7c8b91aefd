use crate::channel::ChannelState;
use crate::peer::{PeerConnectionState, RemoteTrack};
use huddle_core::ParticipantId;

/// Notifications for the application driving a [`crate::RoomClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A peer session was opened.
    PeerJoined(ParticipantId),
    PeerLeft(ParticipantId),
    PeerStateChanged {
        participant: ParticipantId,
        state: PeerConnectionState,
    },
    RemoteTrack {
        participant: ParticipantId,
        track: RemoteTrack,
    },
    RemoteAudioChanged {
        participant: ParticipantId,
        enabled: bool,
    },
    /// The host changed our microphone state.
    MutedByHost {
        by: ParticipantId,
        muted: bool,
    },
    /// Removed from the room by the host. No further events follow.
    Kicked {
        by: ParticipantId,
    },
    ChannelStateChanged(ChannelState),
}
