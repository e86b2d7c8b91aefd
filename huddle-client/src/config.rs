use crate::error::ClientError;
use huddle_core::utils::default_ice_servers;
use huddle_core::{IceServerConfig, RoomId};
use std::time::Duration;

/// Delay before a dropped signaling channel is re-established.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Environment variable holding the signaling base address.
pub const SIGNALING_URL_ENV: &str = "HUDDLE_SIGNALING_URL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the relay, e.g. `ws://localhost:3000`.
    pub signaling_url: String,
    /// Identity of the local user, compared with the room host.
    pub identity: Option<String>,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ClientConfig {
    pub fn new(signaling_url: impl Into<String>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            identity: None,
            ice_servers: default_ice_servers(),
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let url = std::env::var(SIGNALING_URL_ENV)
            .map_err(|_| ClientError::MissingConfig(SIGNALING_URL_ENV))?;
        Ok(Self::new(url))
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    /// Control-channel address of one room. The room id is one path segment.
    pub fn room_url(&self, room_id: &RoomId) -> String {
        format!(
            "{}/ws/{}",
            self.signaling_url.trim_end_matches('/'),
            urlencoding::encode(room_id.as_str())
        )
    }
}
