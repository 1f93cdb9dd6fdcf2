//! Roster
//!
//! Client-side core of the Roster employee directory console. Everything
//! lives in [`roster_core`]; this crate re-exports it for embedders and hosts
//! the end-to-end scenario tests.

pub use roster_core::*;
