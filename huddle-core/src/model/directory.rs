use crate::model::room::RoomId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the room service knows about an active room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    /// Identity of the host, if the room has one. Compared against the
    /// caller's identity to decide moderation privileges.
    pub host: Option<String>,
}

impl RoomInfo {
    pub fn is_host(&self, identity: Option<&str>) -> bool {
        match (self.host.as_deref(), identity) {
            (Some(host), Some(me)) => host == me,
            _ => false,
        }
    }
}

/// Boundary to the external room service. Consulted once per join to gate
/// signaling; `None` means the room is not active.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn lookup(&self, room_id: &RoomId) -> Option<RoomInfo>;
}

/// Treats every room id as active and hostless.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDirectory;

#[async_trait]
impl RoomDirectory for OpenDirectory {
    async fn lookup(&self, room_id: &RoomId) -> Option<RoomInfo> {
        Some(RoomInfo {
            room_id: room_id.clone(),
            host: None,
        })
    }
}

/// Fixed set of rooms, built up front.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    rooms: HashMap<RoomId, Option<String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(mut self, room_id: impl Into<RoomId>, host: Option<&str>) -> Self {
        self.rooms
            .insert(room_id.into(), host.map(|h| h.to_owned()));
        self
    }
}

#[async_trait]
impl RoomDirectory for StaticDirectory {
    async fn lookup(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.rooms.get(room_id).map(|host| RoomInfo {
            room_id: room_id.clone(),
            host: host.clone(),
        })
    }
}
