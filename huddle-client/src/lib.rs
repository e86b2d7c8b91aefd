mod channel;
mod client;
mod config;
mod error;
mod events;
mod media;
mod peer;
mod signaling;

pub use channel::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use media::*;
pub use peer::*;
pub use signaling::*;
