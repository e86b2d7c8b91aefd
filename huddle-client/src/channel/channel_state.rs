#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// First connection attempt in progress.
    Connecting,
    /// Socket is up and `join` has been queued.
    Open,
    /// Connection was lost; waiting out the reconnect delay or dialing again.
    Reconnecting,
    /// Shut down by the local participant. Terminal.
    Closed,
}

impl ChannelState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ChannelState::Closed)
    }
}
