//! Error handling for the roster core
//!
//! Every layer reports its own typed error; [`RosterError`] gathers them for
//! callers that handle all failures in one place, and [`UserFriendlyError`]
//! turns any of them into a message fit for the console.

mod types;
mod user_messages;

pub use types::{RosterError, RosterResult};
pub use user_messages::{ErrorCategory, UserFriendlyError};
