use crate::room::participant_connection::{ConnectionId, ParticipantConnection};
use huddle_core::{ParticipantId, SignalMessage};
use tokio::sync::oneshot;

/// Commands delivered to a room actor by the websocket layer.
#[derive(Debug)]
pub enum RoomCommand {
    /// A socket announced itself as `participant_id`. Replaces any prior
    /// connection registered under the same id.
    Join {
        participant_id: ParticipantId,
        connection: ParticipantConnection,
    },

    /// A routed message from an already joined socket.
    Signal {
        participant_id: ParticipantId,
        connection_id: ConnectionId,
        message: SignalMessage,
    },

    /// The socket closed. Ignored if the participant has since re-joined
    /// over a different connection.
    Disconnect {
        participant_id: ParticipantId,
        connection_id: ConnectionId,
    },

    /// Snapshot of the registered participant ids.
    Inspect {
        reply: oneshot::Sender<Vec<ParticipantId>>,
    },
}
