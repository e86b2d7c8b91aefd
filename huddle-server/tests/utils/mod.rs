
pub use signal_helpers::*;
pub use test_participant::*;
pub use ws_client::*;
