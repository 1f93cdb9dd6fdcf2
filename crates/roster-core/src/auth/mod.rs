//! Authorization gate
//!
//! The single checkpoint that decides what the current session may see and
//! do. Every decision is a pure function of the [`Session`](crate::Session):
//! - [`resolve`]: capability check with a distinct `Pending` outcome while a
//!   restored session is being confirmed
//! - [`guard`] / [`enter`]: route-level decisions
//! - [`require_admin`]: the only way to obtain an [`AdminGrant`]
//! - [`affordances`]: what the UI should offer

mod gate;
mod routes;

pub use gate::{
    Access, AdminGrant, Affordances, Capability, affordances, enter, guard, landing,
    require_admin, resolve,
};
pub use routes::Route;
