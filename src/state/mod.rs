//! State module for tracking traversal progress
//!
//! `LinkState` records how each visited URL was resolved. The per-session
//! bookkeeping that uses it lives in `crawler::session`.

mod link_state;

pub use link_state::LinkState;
