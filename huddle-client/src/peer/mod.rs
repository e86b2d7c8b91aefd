mod candidate_queue;
mod peer_command;
mod peer_connection;
mod peer_session;
mod rtc_connection;
mod session_manager;
mod session_snapshot;

pub(crate) use candidate_queue::*;
pub(crate) use peer_command::*;
pub use peer_connection::*;
pub(crate) use peer_session::*;
pub use rtc_connection::*;
pub use session_manager::*;
pub use session_snapshot::*;
