use crate::events::RoomEvent;
use crate::media::{LocalTracks, MediaTrack, TrackKind};
use crate::peer::{
    PeerCommand, PeerConnectionFactory, PeerHandle, PeerSession, SessionContext, SessionSnapshot,
};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use futures::future::join_all;
use huddle_core::{ParticipantId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const PEER_EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// We joined after them: we send the offer.
    Offerer,
    /// They joined after us: we wait for their offer.
    Answerer,
}

/// Owns one peer session per remote participant and routes inbound
/// negotiation messages to them.
///
/// The joiner offers to everyone already present; existing participants
/// only answer. Together with the relay's join ordering this keeps exactly
/// one offerer per pair.
#[derive(Clone)]
pub struct PeerSessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    ctx: SessionContext,
    factory: Arc<dyn PeerConnectionFactory>,
    sessions: DashMap<ParticipantId, PeerHandle>,
}

impl PeerSessionManager {
    /// Session changes are reported on `events`.
    pub fn new(
        local_id: ParticipantId,
        factory: Arc<dyn PeerConnectionFactory>,
        output: Arc<dyn SignalingOutput>,
        events: mpsc::UnboundedSender<RoomEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                ctx: SessionContext {
                    local_id,
                    output,
                    local: Arc::new(LocalTracks::new()),
                    events,
                },
                factory,
                sessions: DashMap::new(),
            }),
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.inner.ctx.local_id
    }

    pub(crate) fn local_tracks(&self) -> Arc<LocalTracks> {
        self.inner.ctx.local.clone()
    }

    /// Apply one inbound control message. Messages that are not about
    /// peer sessions are ignored.
    pub async fn handle_signal(&self, msg: SignalMessage) {
        match msg {
            SignalMessage::Participants { participants } => {
                info!(count = participants.len(), "Connecting to existing participants");
                let mut opened = false;
                for remote in participants {
                    if remote == *self.local_id() {
                        continue;
                    }
                    opened |= self.open_session(remote, Role::Offerer).await.is_some();
                }
                if opened {
                    self.announce_muted_audio();
                }
            }

            SignalMessage::ParticipantJoined { from } => {
                if from != *self.local_id() && self.open_session(from, Role::Answerer).await.is_some()
                {
                    self.announce_muted_audio();
                }
            }

            SignalMessage::ParticipantLeft { from } => self.close_session(&from).await,

            SignalMessage::Offer { from, to, sdp } => {
                if to != *self.local_id() {
                    debug!(from = %from, to = %to, "Offer addressed to someone else");
                    return;
                }
                let handle = match self.handle(&from) {
                    Some(handle) => handle,
                    None => {
                        debug!(remote = %from, "Offer from unknown participant, opening session");
                        match self.open_session(from.clone(), Role::Answerer).await {
                            Some(handle) => handle,
                            None => return,
                        }
                    }
                };
                handle.send(PeerCommand::RemoteOffer(sdp));
            }

            SignalMessage::Answer { from, sdp, .. } => match self.handle(&from) {
                Some(handle) => {
                    handle.send(PeerCommand::RemoteAnswer(sdp));
                }
                None => debug!(remote = %from, "Answer for unknown session dropped"),
            },

            SignalMessage::IceCandidate {
                from, candidate, ..
            } => match self.handle(&from) {
                Some(handle) => {
                    handle.send(PeerCommand::RemoteCandidate(candidate));
                }
                None => debug!(remote = %from, "Candidate for unknown session dropped"),
            },

            SignalMessage::AudioToggle {
                from,
                audio_enabled,
            } => self.set_remote_audio(&from, audio_enabled),

            other => debug!(kind = other.kind(), "Not a peer session message"),
        }
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn has_session(&self, remote: &ParticipantId) -> bool {
        self.inner.sessions.contains_key(remote)
    }

    pub fn remote_ids(&self) -> Vec<ParticipantId> {
        self.inner.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn snapshot(&self, remote: &ParticipantId) -> Option<SessionSnapshot> {
        self.handle(remote).map(|h| h.snapshot())
    }

    pub fn subscribe(&self, remote: &ParticipantId) -> Option<watch::Receiver<SessionSnapshot>> {
        self.handle(remote).map(|h| h.subscribe())
    }

    /// Resolves once every session has handled everything queued so far.
    pub async fn settle(&self) {
        join_all(
            self.handles()
                .into_iter()
                .map(|h| async move { h.request(PeerCommand::Barrier).await }),
        )
        .await;
    }

    /// Record the host's moderation flag for a remote participant.
    pub fn set_moderation_muted(&self, remote: &ParticipantId, muted: bool) -> bool {
        match self.handle(remote) {
            Some(handle) => {
                handle.update(|s| s.moderation_muted = muted);
                true
            }
            None => false,
        }
    }

    /// Close every session, e.g. when leaving or being kicked.
    pub async fn close_all(&self) {
        let remotes = self.remote_ids();
        join_all(remotes.iter().map(|r| self.close_session(r))).await;
    }

    pub(crate) async fn sync_tracks(&self, tracks: Vec<MediaTrack>) {
        join_all(self.handles().into_iter().map(|h| {
            let tracks = tracks.clone();
            async move { h.request(|done| PeerCommand::SyncTracks { tracks, done }).await }
        }))
        .await;
    }

    pub(crate) async fn set_audio(&self, enabled: bool, original: Option<MediaTrack>) {
        join_all(self.handles().into_iter().map(|h| {
            let original = original.clone();
            async move {
                h.request(|done| PeerCommand::SetAudio {
                    enabled,
                    original,
                    done,
                })
                .await
            }
        }))
        .await;
    }

    async fn open_session(&self, remote: ParticipantId, role: Role) -> Option<PeerHandle> {
        if let Some((_, previous)) = self.inner.sessions.remove(&remote) {
            info!(remote = %remote, "Replacing existing peer session");
            previous.shutdown().await;
        }

        let (event_tx, event_rx) = mpsc::channel(PEER_EVENT_BUFFER);
        let connection = match self.inner.factory.create(&remote, event_tx).await {
            Ok(connection) => connection,
            Err(e) => {
                error!(remote = %remote, "Failed to create peer connection: {:#}", e);
                return None;
            }
        };

        let (session, handle) = PeerSession::new(
            self.inner.ctx.clone(),
            remote.clone(),
            connection,
            event_rx,
        );
        // Registered before it starts, so a concurrent stream change either
        // reaches it as a command or is already visible when it attaches.
        self.inner.sessions.insert(remote.clone(), handle.clone());
        tokio::spawn(session.run());
        info!(remote = %remote, ?role, "Peer session opened");

        if role == Role::Offerer {
            handle.send(PeerCommand::SendOffer);
        }
        let _ = self.inner.ctx.events.send(RoomEvent::PeerJoined(remote));

        Some(handle)
    }

    async fn close_session(&self, remote: &ParticipantId) {
        let Some((_, handle)) = self.inner.sessions.remove(remote) else {
            debug!(remote = %remote, "No session to close");
            return;
        };
        handle.shutdown().await;
        info!(remote = %remote, "Peer session closed");
        let _ = self
            .inner
            .ctx
            .events
            .send(RoomEvent::PeerLeft(remote.clone()));
    }

    /// A fresh session assumes the remote side is unmuted, so a muted
    /// microphone is re-announced whenever new peers appear.
    fn announce_muted_audio(&self) {
        if self.inner.ctx.local.is_enabled(TrackKind::Audio) {
            return;
        }
        let sent = self.inner.ctx.output.send(SignalMessage::AudioToggle {
            from: self.local_id().clone(),
            audio_enabled: false,
        });
        if !sent {
            debug!("Muted state not announced, channel not open");
        }
    }

    fn set_remote_audio(&self, remote: &ParticipantId, enabled: bool) {
        let Some(handle) = self.handle(remote) else {
            warn!(remote = %remote, "Audio state for unknown participant");
            return;
        };
        handle.update(|s| s.remote_audio_enabled = enabled);
        let _ = self.inner.ctx.events.send(RoomEvent::RemoteAudioChanged {
            participant: remote.clone(),
            enabled,
        });
    }

    fn handle(&self, remote: &ParticipantId) -> Option<PeerHandle> {
        self.inner.sessions.get(remote).map(|h| h.clone())
    }

    fn handles(&self) -> Vec<PeerHandle> {
        self.inner.sessions.iter().map(|e| e.value().clone()).collect()
    }
}
