use crate::channel::{ChannelState, SignalingChannel};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::RoomEvent;
use crate::media::{LocalMedia, MediaConstraints, MediaSource};
use crate::peer::{PeerConnectionFactory, PeerSessionManager, RtcConnectionFactory};
use crate::signaling::SignalingOutput;
use huddle_core::{ParticipantId, RoomDirectory, RoomId, RoomInfo, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A participant in one room: the signaling channel, a peer session per
/// remote participant, and the local media they share.
pub struct RoomClient {
    room: RoomInfo,
    is_host: bool,
    channel: SignalingChannel,
    sessions: PeerSessionManager,
    media: LocalMedia,
    dispatcher: JoinHandle<()>,
}

impl RoomClient {
    /// Join with webrtc-rs connections built from `config.ice_servers`.
    pub async fn join(
        config: ClientConfig,
        directory: &dyn RoomDirectory,
        room_id: RoomId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RoomEvent>), ClientError> {
        let factory = Arc::new(RtcConnectionFactory::new(config.ice_servers.clone()));
        Self::join_with(config, directory, room_id, factory).await
    }

    /// Join a room that `directory` reports as active. The channel keeps
    /// re-joining after drops until [`RoomClient::leave`].
    pub async fn join_with(
        config: ClientConfig,
        directory: &dyn RoomDirectory,
        room_id: RoomId,
        factory: Arc<dyn PeerConnectionFactory>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RoomEvent>), ClientError> {
        let Some(room) = directory.lookup(&room_id).await else {
            return Err(ClientError::RoomInactive(room_id));
        };
        let is_host = room.is_host(config.identity.as_deref());
        let participant_id = ParticipantId::new();

        let (channel, inbound) =
            SignalingChannel::connect(config.room_url(&room.room_id), participant_id.clone());
        let output: Arc<dyn SignalingOutput> = Arc::new(channel.clone());
        let (events, events_rx) = mpsc::unbounded_channel();

        let sessions =
            PeerSessionManager::new(participant_id.clone(), factory, output.clone(), events.clone());
        let media = LocalMedia::new(sessions.clone(), output);

        let dispatcher = tokio::spawn(dispatch(
            inbound,
            channel.subscribe(),
            channel.clone(),
            sessions.clone(),
            media.clone(),
            events,
        ));

        info!(room = %room.room_id, participant = %participant_id, is_host, "Joining room");

        Ok((
            Self {
                room,
                is_host,
                channel,
                sessions,
                media,
                dispatcher,
            },
            events_rx,
        ))
    }

    pub fn participant_id(&self) -> &ParticipantId {
        self.channel.participant_id()
    }

    pub fn room(&self) -> &RoomInfo {
        &self.room
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn channel(&self) -> &SignalingChannel {
        &self.channel
    }

    pub fn sessions(&self) -> &PeerSessionManager {
        &self.sessions
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub async fn acquire_media(
        &self,
        source: &dyn MediaSource,
        constraints: MediaConstraints,
    ) -> Result<(), ClientError> {
        Ok(self.media.acquire(source, constraints).await?)
    }

    pub async fn set_audio_enabled(&self, enabled: bool) {
        self.media.set_audio_enabled(enabled).await;
    }

    pub fn set_video_enabled(&self, enabled: bool) {
        self.media.set_video_enabled(enabled);
    }

    /// Host only: remove `target` from the room.
    pub async fn kick(&self, target: &ParticipantId) -> Result<(), ClientError> {
        if !self.is_host {
            return Err(ClientError::NotHost("kick participants"));
        }
        self.channel.ready().await?;
        let sent = self.channel.send(SignalMessage::Kick {
            from: self.participant_id().clone(),
            to: target.clone(),
        });
        if !sent {
            warn!(target = %target, "Kick not sent, channel dropped");
        }
        Ok(())
    }

    /// Host only: ask `target` to mute or unmute its microphone.
    pub async fn mute_participant(
        &self,
        target: &ParticipantId,
        muted: bool,
    ) -> Result<(), ClientError> {
        if !self.is_host {
            return Err(ClientError::NotHost("mute participants"));
        }
        self.sessions.set_moderation_muted(target, muted);
        self.channel.ready().await?;
        let sent = self.channel.send(SignalMessage::Mute {
            from: self.participant_id().clone(),
            to: target.clone(),
            muted,
        });
        if !sent {
            warn!(target = %target, "Mute not sent, channel dropped");
        }
        Ok(())
    }

    /// Leave the room: announce it, close every session and release media.
    pub async fn leave(self) {
        info!(room = %self.room.room_id, participant = %self.participant_id(), "Leaving room");
        self.channel.disconnect().await;
        self.dispatcher.abort();
        self.sessions.close_all().await;
        self.media.stop();
    }
}

impl Drop for RoomClient {
    /// Dropping without [`RoomClient::leave`] still leaves the room: the
    /// dispatcher's inbound receiver goes away, which closes the channel.
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.media.stop();
    }
}

/// Applies inbound control messages in arrival order.
async fn dispatch(
    mut inbound: mpsc::UnboundedReceiver<SignalMessage>,
    mut channel_state: watch::Receiver<ChannelState>,
    channel: SignalingChannel,
    sessions: PeerSessionManager,
    media: LocalMedia,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    let mut watching_state = true;

    loop {
        tokio::select! {
            changed = channel_state.changed(), if watching_state => {
                if changed.is_err() {
                    watching_state = false;
                    continue;
                }
                let state = *channel_state.borrow_and_update();
                let _ = events.send(RoomEvent::ChannelStateChanged(state));
            }

            msg = inbound.recv() => {
                let Some(msg) = msg else { break };

                match msg {
                    SignalMessage::Kicked { from } => {
                        warn!(by = %from, "Kicked from room");
                        sessions.close_all().await;
                        media.stop();
                        channel.abandon().await;
                        let _ = events.send(RoomEvent::Kicked { by: from });
                        break;
                    }

                    SignalMessage::Mute { from, muted, .. } => {
                        info!(by = %from, muted, "Host changed microphone state");
                        media.set_audio_enabled(!muted).await;
                        let _ = events.send(RoomEvent::MutedByHost { by: from, muted });
                    }

                    SignalMessage::Error { message } => {
                        warn!("Relay rejected a message: {}", message);
                    }

                    other => sessions.handle_signal(other).await,
                }
            }
        }
    }
}
