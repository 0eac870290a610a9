pub mod command;
pub mod poll;

pub use command::{decode_command, Command, DecodeError};
pub use poll::{Poll, PollCollectionState, PollOption};
