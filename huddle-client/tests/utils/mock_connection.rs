use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use huddle_client::{
    MediaTrack, PeerConnection, PeerConnectionFactory, PeerEvent, SenderId, SenderInfo, TrackKind,
};
use huddle_core::{IceCandidate, ParticipantId, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One call made on a [`MockPeerConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PcOp {
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind),
    AddCandidate(String),
    AddTrack(String),
    RemoveSender(SenderId),
    ReplaceTrack(SenderId, Option<String>),
    Close,
}

/// In-memory peer connection that records every call.
///
/// Candidates containing `bad` fail to apply. A candidate applied before
/// any remote description is counted as early and rejected.
pub struct MockPeerConnection {
    pub remote: ParticipantId,
    ops: Mutex<Vec<PcOp>>,
    senders: Mutex<Vec<SenderInfo>>,
    next_sender: AtomicU64,
    remote_set: AtomicBool,
    reject_remote: AtomicBool,
    early_candidates: AtomicUsize,
    events: mpsc::Sender<PeerEvent>,
}

impl MockPeerConnection {
    pub fn new(remote: ParticipantId, events: mpsc::Sender<PeerEvent>) -> Self {
        Self {
            remote,
            ops: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
            next_sender: AtomicU64::new(1),
            remote_set: AtomicBool::new(false),
            reject_remote: AtomicBool::new(false),
            early_candidates: AtomicUsize::new(0),
            events,
        }
    }

    pub fn ops(&self) -> Vec<PcOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn count(&self, op: &PcOp) -> usize {
        self.ops().iter().filter(|o| *o == op).count()
    }

    pub fn applied_candidates(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                PcOp::AddCandidate(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn early_candidates(&self) -> usize {
        self.early_candidates.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.ops().contains(&PcOp::Close)
    }

    /// Track ids currently attached to senders.
    pub fn sender_track_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .senders
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s.track.as_ref().map(|t| t.id().to_owned()))
            .collect();
        ids.sort();
        ids
    }

    pub fn sender_tracks(&self, kind: TrackKind) -> Vec<MediaTrack> {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kind == kind)
            .filter_map(|s| s.track.clone())
            .collect()
    }

    /// Drop the track from every sender of `kind`, as if it had ended.
    pub fn detach_tracks(&self, kind: TrackKind) {
        for sender in self.senders.lock().unwrap().iter_mut() {
            if sender.kind == kind {
                sender.track = None;
            }
        }
    }

    pub fn reject_remote_descriptions(&self) {
        self.reject_remote.store(true, Ordering::SeqCst);
    }

    /// Inject a transport event as if raised by the connection.
    pub async fn emit(&self, event: PeerEvent) {
        self.events.send(event).await.unwrap();
    }

    fn record(&self, op: PcOp) {
        self.ops.lock().unwrap().push(op);
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(PcOp::CreateOffer);
        Ok(SessionDescription::offer(format!("v=0 offer-to-{}", self.remote)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        if !self.remote_set.load(Ordering::SeqCst) {
            bail!("no remote offer");
        }
        self.record(PcOp::CreateAnswer);
        Ok(SessionDescription::answer(format!("v=0 answer-to-{}", self.remote)))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        if self.reject_remote.load(Ordering::SeqCst) {
            bail!("malformed sdp");
        }
        self.record(PcOp::SetRemote(desc.kind));
        self.remote_set.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if !self.remote_set.load(Ordering::SeqCst) {
            self.early_candidates.fetch_add(1, Ordering::SeqCst);
            bail!("remote description not set");
        }
        if candidate.candidate.contains("bad") {
            bail!("malformed candidate");
        }
        self.record(PcOp::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn add_track(&self, track: MediaTrack) -> Result<SenderId> {
        self.record(PcOp::AddTrack(track.id().to_owned()));
        let id = self.next_sender.fetch_add(1, Ordering::SeqCst);
        self.senders.lock().unwrap().push(SenderInfo {
            id,
            kind: track.kind(),
            track: Some(track),
        });
        Ok(id)
    }

    async fn senders(&self) -> Vec<SenderInfo> {
        self.senders.lock().unwrap().clone()
    }

    async fn remove_sender(&self, sender: SenderId) -> Result<()> {
        let mut senders = self.senders.lock().unwrap();
        let before = senders.len();
        senders.retain(|s| s.id != sender);
        if senders.len() == before {
            return Err(anyhow!("unknown sender {}", sender));
        }
        drop(senders);
        self.record(PcOp::RemoveSender(sender));
        Ok(())
    }

    async fn replace_track(&self, sender: SenderId, track: Option<MediaTrack>) -> Result<()> {
        self.record(PcOp::ReplaceTrack(
            sender,
            track.as_ref().map(|t| t.id().to_owned()),
        ));
        let mut senders = self.senders.lock().unwrap();
        let entry = senders
            .iter_mut()
            .find(|s| s.id == sender)
            .ok_or_else(|| anyhow!("unknown sender {}", sender))?;
        entry.track = track;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(PcOp::Close);
        Ok(())
    }
}

/// Factory handing out [`MockPeerConnection`]s and remembering each one.
#[derive(Clone, Default)]
pub struct MockConnectionFactory {
    created: Arc<Mutex<Vec<Arc<MockPeerConnection>>>>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connection created for `remote`, oldest first.
    pub fn connections_for(&self, remote: &ParticipantId) -> Vec<Arc<MockPeerConnection>> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.remote == *remote)
            .cloned()
            .collect()
    }

    pub fn latest(&self, remote: &ParticipantId) -> Arc<MockPeerConnection> {
        self.connections_for(remote)
            .pop()
            .unwrap_or_else(|| panic!("no connection created for {}", remote))
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl PeerConnectionFactory for MockConnectionFactory {
    async fn create(
        &self,
        remote: &ParticipantId,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>> {
        let connection = Arc::new(MockPeerConnection::new(remote.clone(), events));
        self.created.lock().unwrap().push(connection.clone());
        Ok(connection)
    }
}
