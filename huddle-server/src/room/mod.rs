mod participant_connection;
mod room;
mod room_command;
mod room_manager;

pub use participant_connection::*;
pub use room::*;
pub use room_command::*;
pub use room_manager::*;
