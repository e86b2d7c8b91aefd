use crate::media::MediaTrack;
use huddle_core::{IceCandidate, SessionDescription};
use tokio::sync::oneshot;

/// Work items for a peer session actor, processed strictly in order.
pub(crate) enum PeerCommand {
    SendOffer,
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),

    /// Make the senders match `tracks`.
    SyncTracks {
        tracks: Vec<MediaTrack>,
        done: oneshot::Sender<()>,
    },

    /// Mute or unmute every audio sender. `original` is re-attached to
    /// senders that have no track when unmuting.
    SetAudio {
        enabled: bool,
        original: Option<MediaTrack>,
        done: oneshot::Sender<()>,
    },

    /// Replies once everything queued before it has been handled.
    Barrier(oneshot::Sender<()>),
}
