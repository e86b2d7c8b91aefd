use crate::room::{Room, RoomCommand};
use dashmap::DashMap;
use huddle_core::{ParticipantId, RoomId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const ROOM_COMMAND_BUFFER: usize = 100;

struct RoomHandle {
    generation: u64,
    tx: mpsc::Sender<RoomCommand>,
}

/// Process-wide registry of live rooms. A room is spawned by the first
/// `Join` addressed to it and removes itself once its last participant is
/// gone.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    next_generation: Arc<AtomicU64>,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Deliver a command to its room. Only `Join` may create a room; any
    /// other command for an unknown room is dropped.
    pub async fn dispatch(&self, room_id: &RoomId, cmd: RoomCommand) {
        let mut cmd = cmd;

        loop {
            let tx = match &cmd {
                RoomCommand::Join { .. } => self.get_or_create(room_id),
                _ => match self.rooms.get(room_id) {
                    Some(handle) => handle.tx.clone(),
                    None => {
                        debug!(room = %room_id, "No such room, command dropped");
                        return;
                    }
                },
            };

            match tx.send(cmd).await {
                Ok(()) => return,
                // The room retired between lookup and send; its map entry is
                // already gone, so the next lookup sees the replacement.
                Err(mpsc::error::SendError(returned)) => cmd = returned,
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_room_active(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub async fn participants(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(room_id, RoomCommand::Inspect { reply }).await;
        rx.await.unwrap_or_default()
    }

    pub async fn participant_count(&self, room_id: &RoomId) -> usize {
        self.participants(room_id).await.len()
    }

    fn get_or_create(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!(room = %room_id, "Creating new room");
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = mpsc::channel(ROOM_COMMAND_BUFFER);

                let room = Room::new(room_id.clone(), generation, rx, self.clone());
                tokio::spawn(room.run());

                RoomHandle { generation, tx }
            })
            .tx
            .clone()
    }

    /// Called by a retiring room. A newer room under the same id is kept.
    pub(crate) fn forget(&self, room_id: &RoomId, generation: u64) {
        if self
            .rooms
            .remove_if(room_id, |_, handle| handle.generation == generation)
            .is_some()
        {
            info!(room = %room_id, "Room discarded");
        }
    }
}
