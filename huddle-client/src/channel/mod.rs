mod channel_state;
mod signaling_channel;

pub use channel_state::*;
pub use signaling_channel::*;
