mod directory;
mod participant;
mod room;
mod signaling;

pub use directory::{OpenDirectory, RoomDirectory, RoomInfo, StaticDirectory};
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalMessage};
