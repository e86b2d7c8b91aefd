use async_trait::async_trait;
use huddle_core::SignalMessage;

/// Outbound half of the control channel, as seen by peer sessions and the
/// media reconciler.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a message if the channel is open right now. Returns `false`
    /// when it was dropped.
    fn send(&self, msg: SignalMessage) -> bool;

    /// Wait for the channel to open, then queue the message. Returns
    /// `false` if the channel shut down for good first.
    async fn send_when_ready(&self, msg: SignalMessage) -> bool;
}
