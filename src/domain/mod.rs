//! Domain types for chloop
//!
//! - InvocationRecord: the structured outcome of one command invocation
//! - Failure: captured details of an action that failed
//! - WishRecord: a note about a key or command the user wishes existed

pub mod record;
pub mod wish;

pub use record::{Failure, INVALID_COMMAND, InvocationRecord, NOTE_CMD, Status};
pub use wish::WishRecord;
