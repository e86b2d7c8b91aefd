pub mod mock_connection;

pub use fixtures::*;
pub use mock_connection::*;
pub use mock_media::*;
pub use mock_signaling::*;
pub use scripted_server::*;
