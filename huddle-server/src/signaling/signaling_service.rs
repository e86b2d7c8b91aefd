use crate::room::RoomManager;
use huddle_core::{OpenDirectory, RoomDirectory, RoomId, RoomInfo};
use std::sync::Arc;

struct SignalingInner {
    directory: Arc<dyn RoomDirectory>,
}

/// Shared state of the websocket layer: the room registry plus the external
/// room service used to gate joins.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) rooms: RoomManager,
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new(Arc::new(OpenDirectory))
    }
}

impl SignalingService {
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self {
            inner: Arc::new(SignalingInner { directory }),
            rooms: RoomManager::new(),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub async fn lookup_room(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.inner.directory.lookup(room_id).await
    }
}
