//! Core types and the discovery & matching engine for Halal Match.
//!
//! This crate is deliberately free of database, network and UI dependencies.
//! Collaborators (persistence, candidate data, location) are reached through
//! the traits in [`store`], [`source`] and [`location`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod decision;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod geo;
pub mod location;
pub mod matches;
pub mod profile;
pub mod quota;
pub mod session;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use session::DiscoverySession;
