use crate::events::RoomEvent;
use crate::media::{LocalTracks, MediaTrack, TrackKind};
use crate::peer::{
    CandidateQueue, PeerCommand, PeerConnection, PeerConnectionState, PeerEvent, SessionPhase,
    SessionSnapshot,
};
use crate::signaling::SignalingOutput;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription, SignalMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Collaborators shared by every session of one client.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub(crate) local_id: ParticipantId,
    pub(crate) output: Arc<dyn SignalingOutput>,
    pub(crate) local: Arc<LocalTracks>,
    pub(crate) events: mpsc::UnboundedSender<RoomEvent>,
}

enum Negotiation {
    /// No remote description yet; candidates wait here.
    AwaitingRemote(CandidateQueue),
    /// Candidates go straight to the connection.
    RemoteApplied,
}

enum Step {
    Command(PeerCommand),
    Event(PeerEvent),
}

/// Registry entry for a running session.
#[derive(Clone)]
pub(crate) struct PeerHandle {
    commands: mpsc::UnboundedSender<PeerCommand>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    connection: Arc<dyn PeerConnection>,
    cancel: CancellationToken,
}

impl PeerHandle {
    pub(crate) fn send(&self, cmd: PeerCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Send a command carrying a completion signal and wait for it. Returns
    /// early if the session ends first.
    pub(crate) async fn request(&self, build: impl FnOnce(oneshot::Sender<()>) -> PeerCommand) {
        let (done, rx) = oneshot::channel();
        if self.send(build(done)) {
            let _ = rx.await;
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(f);
    }

    /// Stop the actor and close the connection. Work still in flight is
    /// abandoned; queued candidates are never applied.
    pub(crate) async fn shutdown(&self) {
        self.cancel.cancel();
        self.update(|s| {
            s.phase = SessionPhase::Closed;
            s.pending_candidates = 0;
        });
        if let Err(e) = self.connection.close().await {
            debug!("Error closing peer connection: {:#}", e);
        }
    }
}

/// Negotiation actor for one remote participant. Commands and transport
/// events are handled one at a time, so a description and the candidates
/// that follow it can never be applied out of order.
pub(crate) struct PeerSession {
    ctx: SessionContext,
    remote_id: ParticipantId,
    connection: Arc<dyn PeerConnection>,
    negotiation: Negotiation,
    command_rx: mpsc::UnboundedReceiver<PeerCommand>,
    event_rx: mpsc::Receiver<PeerEvent>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    cancel: CancellationToken,
}

impl PeerSession {
    /// The session does nothing until `run` is spawned.
    pub(crate) fn new(
        ctx: SessionContext,
        remote_id: ParticipantId,
        connection: Arc<dyn PeerConnection>,
        event_rx: mpsc::Receiver<PeerEvent>,
    ) -> (Self, PeerHandle) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(SessionSnapshot::new(remote_id.clone()));
        let snapshot = Arc::new(snapshot);
        let cancel = CancellationToken::new();

        let session = PeerSession {
            ctx,
            remote_id,
            connection: connection.clone(),
            negotiation: Negotiation::AwaitingRemote(CandidateQueue::default()),
            command_rx,
            event_rx,
            snapshot: snapshot.clone(),
            cancel: cancel.clone(),
        };

        let handle = PeerHandle {
            commands,
            snapshot,
            connection,
            cancel,
        };
        (session, handle)
    }

    pub(crate) async fn run(mut self) {
        debug!(remote = %self.remote_id, "Peer session started");
        let cancel = self.cancel.clone();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = self.attach_local_tracks() => {}
        }

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    None => break,
                },
                Some(event) = self.event_rx.recv() => Step::Event(event),
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.step(step) => {}
            }
        }

        self.teardown().await;
    }

    async fn step(&mut self, step: Step) {
        match step {
            Step::Command(cmd) => self.handle_command(cmd).await,
            Step::Event(event) => self.handle_event(event).await,
        }
    }

    async fn handle_command(&mut self, cmd: PeerCommand) {
        match cmd {
            PeerCommand::SendOffer => self.send_offer().await,
            PeerCommand::RemoteOffer(desc) => self.accept_offer(desc).await,
            PeerCommand::RemoteAnswer(desc) => self.accept_answer(desc).await,
            PeerCommand::RemoteCandidate(candidate) => self.add_remote_candidate(candidate).await,
            PeerCommand::SyncTracks { tracks, done } => {
                self.sync_tracks(tracks).await;
                let _ = done.send(());
            }
            PeerCommand::SetAudio {
                enabled,
                original,
                done,
            } => {
                self.set_audio(enabled, original).await;
                let _ = done.send(());
            }
            PeerCommand::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn handle_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::CandidateGenerated(candidate) => {
                let msg = SignalMessage::IceCandidate {
                    from: self.ctx.local_id.clone(),
                    to: self.remote_id.clone(),
                    candidate,
                };
                if !self.ctx.output.send_when_ready(msg).await {
                    debug!(remote = %self.remote_id, "Local candidate dropped, channel closed");
                }
            }

            PeerEvent::StateChanged(state) => {
                info!(remote = %self.remote_id, ?state, "Peer connection state changed");
                self.update(|s| {
                    s.connection_state = state;
                    if state == PeerConnectionState::Connected
                        && matches!(s.phase, SessionPhase::OfferSent | SessionPhase::AnswerSent)
                    {
                        s.phase = SessionPhase::Connected;
                    }
                });
                self.emit(RoomEvent::PeerStateChanged {
                    participant: self.remote_id.clone(),
                    state,
                });
            }

            PeerEvent::RemoteTrack(track) => {
                debug!(remote = %self.remote_id, track = %track.id, "Remote track received");
                self.update(|s| s.add_remote_track(track.clone()));
                self.emit(RoomEvent::RemoteTrack {
                    participant: self.remote_id.clone(),
                    track,
                });
            }
        }
    }

    async fn attach_local_tracks(&self) {
        for track in self.ctx.local.current() {
            if let Err(e) = self.connection.add_track(track).await {
                warn!(remote = %self.remote_id, "Failed to attach local track: {:#}", e);
            }
        }
    }

    async fn send_offer(&mut self) {
        if self.phase() != SessionPhase::New {
            debug!(remote = %self.remote_id, "Negotiation already started, not offering again");
            return;
        }

        let offer = match self.connection.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                error!(remote = %self.remote_id, "Failed to create offer: {:#}", e);
                return;
            }
        };
        self.update(|s| s.phase = SessionPhase::OfferSent);

        let msg = SignalMessage::Offer {
            from: self.ctx.local_id.clone(),
            to: self.remote_id.clone(),
            sdp: offer,
        };
        if !self.ctx.output.send_when_ready(msg).await {
            warn!(remote = %self.remote_id, "Offer not delivered, channel closed");
        }
    }

    async fn accept_offer(&mut self, desc: SessionDescription) {
        let phase = self.phase();
        if phase != SessionPhase::New {
            warn!(remote = %self.remote_id, ?phase, "Ignoring offer, negotiation already under way");
            return;
        }

        if let Err(e) = self.connection.set_remote_description(desc).await {
            error!(remote = %self.remote_id, "Failed to apply remote offer: {:#}", e);
            return;
        }
        self.flush_candidates().await;

        let answer = match self.connection.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                error!(remote = %self.remote_id, "Failed to create answer: {:#}", e);
                return;
            }
        };
        self.update(|s| s.phase = SessionPhase::AnswerSent);

        let msg = SignalMessage::Answer {
            from: self.ctx.local_id.clone(),
            to: self.remote_id.clone(),
            sdp: answer,
        };
        if !self.ctx.output.send_when_ready(msg).await {
            warn!(remote = %self.remote_id, "Answer not delivered, channel closed");
        }
    }

    async fn accept_answer(&mut self, desc: SessionDescription) {
        let phase = self.phase();
        if phase != SessionPhase::OfferSent || matches!(self.negotiation, Negotiation::RemoteApplied)
        {
            warn!(remote = %self.remote_id, ?phase, "Ignoring unexpected answer");
            return;
        }

        if let Err(e) = self.connection.set_remote_description(desc).await {
            error!(remote = %self.remote_id, "Failed to apply remote answer: {:#}", e);
            return;
        }
        self.flush_candidates().await;
    }

    async fn add_remote_candidate(&mut self, candidate: IceCandidate) {
        match &mut self.negotiation {
            Negotiation::AwaitingRemote(queue) => {
                queue.push(candidate);
                let pending = queue.len();
                debug!(remote = %self.remote_id, pending, "Queued early ICE candidate");
                self.update(|s| s.pending_candidates = pending);
            }
            Negotiation::RemoteApplied => self.apply_candidate(candidate).await,
        }
    }

    /// Called right after a remote description was applied.
    async fn flush_candidates(&mut self) {
        let Negotiation::AwaitingRemote(queue) =
            std::mem::replace(&mut self.negotiation, Negotiation::RemoteApplied)
        else {
            return;
        };

        self.update(|s| {
            s.remote_description_applied = true;
            s.pending_candidates = 0;
        });

        for candidate in queue.into_ordered() {
            if self.cancel.is_cancelled() {
                return;
            }
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!(remote = %self.remote_id, "Skipping ICE candidate: {:#}", e);
        }
    }

    async fn sync_tracks(&self, tracks: Vec<MediaTrack>) {
        let senders = self.connection.senders().await;
        let attached: HashSet<&str> = senders
            .iter()
            .filter_map(|s| s.track.as_ref().map(|t| t.id()))
            .collect();
        let wanted: HashSet<&str> = tracks.iter().map(|t| t.id()).collect();

        if attached == wanted {
            debug!(remote = %self.remote_id, "Senders already match local stream");
            return;
        }

        for sender in &senders {
            if let Some(track) = &sender.track
                && !wanted.contains(track.id())
                && let Err(e) = self.connection.remove_sender(sender.id).await
            {
                warn!(remote = %self.remote_id, "Failed to remove sender: {:#}", e);
            }
        }

        for track in &tracks {
            if attached.contains(track.id()) {
                continue;
            }
            if let Err(e) = self.connection.add_track(track.clone()).await {
                warn!(remote = %self.remote_id, "Failed to add track: {:#}", e);
            }
        }
    }

    async fn set_audio(&self, enabled: bool, original: Option<MediaTrack>) {
        let senders = self.connection.senders().await;

        for sender in senders.into_iter().filter(|s| s.kind == TrackKind::Audio) {
            match sender.track {
                Some(track) => track.set_enabled(enabled),
                None if enabled => {
                    let Some(original) = &original else { continue };
                    original.set_enabled(true);
                    if let Err(e) = self
                        .connection
                        .replace_track(sender.id, Some(original.clone()))
                        .await
                    {
                        warn!(remote = %self.remote_id, "Failed to restore audio track: {:#}", e);
                    }
                }
                None => {}
            }
        }
    }

    async fn teardown(&mut self) {
        self.negotiation = Negotiation::RemoteApplied;
        self.update(|s| {
            s.phase = SessionPhase::Closed;
            s.pending_candidates = 0;
        });

        // A cancelled session was already closed by whoever cancelled it.
        if !self.cancel.is_cancelled()
            && let Err(e) = self.connection.close().await
        {
            debug!(remote = %self.remote_id, "Error closing peer connection: {:#}", e);
        }
        debug!(remote = %self.remote_id, "Peer session finished");
    }

    fn phase(&self) -> SessionPhase {
        self.snapshot.borrow().phase
    }

    fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(f);
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.ctx.events.send(event);
    }
}
