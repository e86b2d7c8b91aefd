use huddle_core::SignalMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Outbound half of one participant socket, as seen by a room.
///
/// Sending never awaits: messages go into the socket's unbounded writer
/// queue. Once the writer task is gone the handle reports itself as not
/// writable and every send is dropped.
#[derive(Debug, Clone)]
pub struct ParticipantConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl ParticipantConnection {
    pub fn new(tx: mpsc::UnboundedSender<SignalMessage>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        }
    }

    /// Handle plus the receiving end of its writer queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_writable(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Returns `false` when the message could not be queued.
    pub fn send(&self, msg: SignalMessage) -> bool {
        if !self.is_writable() {
            return false;
        }
        self.tx.send(msg).is_ok()
    }
}
