use crate::channel::ChannelState;
use crate::config::RECONNECT_DELAY;
use crate::error::ChannelError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ParticipantId, SignalMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Persistent control connection of one participant to one room.
///
/// A single supervisor task owns the socket. Every time a socket opens it
/// queues `join` first, so the relay re-registers the participant after a
/// drop. Lost connections are re-dialed after [`RECONNECT_DELAY`] until
/// [`SignalingChannel::disconnect`] is called, the last handle is dropped,
/// or the inbound receiver is dropped. The latter two close without `leave`.
#[derive(Clone)]
pub struct SignalingChannel {
    inner: Arc<ChannelInner>,
    /// Shared by handles only; the supervisor never holds it.
    _guard: Arc<DropGuard>,
}

struct ChannelInner {
    url: String,
    participant_id: ParticipantId,
    state: watch::Sender<ChannelState>,
    /// Writer queue of the live socket. `None` between connections.
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    reconnect: AtomicBool,
    shutdown: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl SignalingChannel {
    /// Start connecting in the background. Parsed inbound messages are
    /// delivered on the returned receiver in arrival order.
    pub fn connect(
        url: impl Into<String>,
        participant_id: ParticipantId,
    ) -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ChannelState::Connecting);

        let inner = Arc::new(ChannelInner {
            url: url.into(),
            participant_id,
            state,
            outbound: Mutex::new(None),
            reconnect: AtomicBool::new(true),
            shutdown: CancellationToken::new(),
            supervisor: Mutex::new(None),
        });

        let handle = tokio::spawn(supervise(inner.clone(), inbound_tx));
        if let Ok(mut slot) = inner.supervisor.lock() {
            *slot = Some(handle);
        }
        let guard = Arc::new(inner.shutdown.clone().drop_guard());

        (
            Self {
                inner,
                _guard: guard,
            },
            inbound_rx,
        )
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.inner.participant_id
    }

    pub fn state(&self) -> ChannelState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.inner.state.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Resolves once the channel is open, or fails if it was closed for good.
    pub async fn ready(&self) -> Result<(), ChannelError> {
        let mut rx = self.inner.state.subscribe();
        let state = *rx
            .wait_for(|s| matches!(s, ChannelState::Open | ChannelState::Closed))
            .await
            .map_err(|_| ChannelError::Closed)?;

        match state {
            ChannelState::Open => Ok(()),
            _ => Err(ChannelError::Closed),
        }
    }

    /// Queue a message on the current socket. Returns `false` if there is
    /// no open socket; nothing is buffered across reconnects.
    pub fn send(&self, msg: SignalMessage) -> bool {
        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                return false;
            }
        };

        let Ok(outbound) = self.inner.outbound.lock() else {
            return false;
        };
        match outbound.as_ref() {
            Some(tx) => tx.send(Message::Text(json.into())).is_ok(),
            None => {
                debug!(kind = msg.kind(), "Channel not open, message dropped");
                false
            }
        }
    }

    /// Leave the room and close for good. Reconnection is disabled first so
    /// the resulting close is not mistaken for a drop.
    pub async fn disconnect(&self) {
        self.shut_down(true).await;
    }

    /// Close for good without announcing a leave, e.g. after being kicked.
    pub async fn abandon(&self) {
        self.shut_down(false).await;
    }

    async fn shut_down(&self, announce_leave: bool) {
        self.inner.reconnect.store(false, Ordering::SeqCst);

        if announce_leave
            && !self.send(SignalMessage::Leave {
                from: self.inner.participant_id.clone(),
            })
        {
            debug!(participant = %self.inner.participant_id, "Leave not sent, channel was not open");
        }

        self.inner.shutdown.cancel();

        let handle = self
            .inner
            .supervisor
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.inner.set_state(ChannelState::Closed);
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    fn send(&self, msg: SignalMessage) -> bool {
        SignalingChannel::send(self, msg)
    }

    async fn send_when_ready(&self, msg: SignalMessage) -> bool {
        if self.ready().await.is_err() {
            return false;
        }
        SignalingChannel::send(self, msg)
    }
}

impl ChannelInner {
    fn set_state(&self, state: ChannelState) {
        if *self.state.borrow() == ChannelState::Closed {
            return;
        }
        self.state.send_replace(state);
    }

    fn should_reconnect(&self) -> bool {
        self.reconnect.load(Ordering::SeqCst) && !self.shutdown.is_cancelled()
    }
}

async fn supervise(inner: Arc<ChannelInner>, inbound: mpsc::UnboundedSender<SignalMessage>) {
    loop {
        if inbound.is_closed() {
            inner.reconnect.store(false, Ordering::SeqCst);
            break;
        }

        let attempt = tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => break,
            attempt = connect_async(inner.url.as_str()) => attempt,
        };

        match attempt {
            Ok((ws, _)) => {
                info!(url = %inner.url, participant = %inner.participant_id, "Signaling channel open");
                run_connection(&inner, ws, &inbound).await;
            }
            Err(e) => warn!(url = %inner.url, "Signaling connection failed: {}", e),
        }

        if !inner.should_reconnect() {
            break;
        }

        inner.set_state(ChannelState::Reconnecting);
        info!(
            participant = %inner.participant_id,
            "Signaling channel lost, reconnecting in {:?}",
            RECONNECT_DELAY
        );

        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => break,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }

    if let Ok(mut outbound) = inner.outbound.lock() {
        *outbound = None;
    }
    inner.state.send_replace(ChannelState::Closed);
    info!(participant = %inner.participant_id, "Signaling channel closed");
}

/// Pump one socket until it drops or the channel is shut down. The writer
/// queue is detached before returning so no send can reach a dead socket.
async fn run_connection(
    inner: &ChannelInner,
    ws: WsStream,
    inbound: &mpsc::UnboundedSender<SignalMessage>,
) {
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    match (SignalMessage::Join {
        from: inner.participant_id.clone(),
    })
    .to_json()
    {
        Ok(json) => {
            let _ = tx.send(Message::Text(json.into()));
        }
        Err(e) => error!("Failed to serialize join: {}", e),
    }

    if let Ok(mut outbound) = inner.outbound.lock() {
        *outbound = Some(tx);
    }
    inner.set_state(ChannelState::Open);

    loop {
        tokio::select! {
            biased;

            out = rx.recv() => match out {
                Some(msg) => {
                    if let Err(e) = sink.send(msg).await {
                        debug!("Signaling write failed: {}", e);
                        break;
                    }
                }
                None => break,
            },

            _ = inner.shutdown.cancelled() => {
                // Flush what `disconnect` queued (the leave) before closing.
                while let Ok(msg) = rx.try_recv() {
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
                break;
            }

            _ = inbound.closed() => {
                debug!(participant = %inner.participant_id, "Inbound receiver dropped, closing channel");
                inner.reconnect.store(false, Ordering::SeqCst);
                inner.shutdown.cancel();
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match SignalMessage::from_json(text.as_str()) {
                    Ok(msg) => {
                        // A dropped receiver is caught by the `closed` branch.
                        let _ = inbound.send(msg);
                    }
                    Err(e) => warn!("Dropping malformed signaling message: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Signaling socket error: {}", e);
                    break;
                }
            }
        }
    }

    if let Ok(mut outbound) = inner.outbound.lock() {
        *outbound = None;
    }
}
