//! # Challenge Sessions
//!
//! ```text
//! store.rs    - ChallengeSession, SessionStore trait, MemorySessionStore
//! manager.rs  - ChallengeSessionManager (issue / fetch / consume / settle)
//! ```
//!
//! Persistent sessions live in [`crate::storage::ScholarDB`], which
//! implements the same [`SessionStore`] trait.

pub mod manager;
pub mod store;

pub use manager::{ChallengeSessionManager, SessionVerdict};
pub use store::{ChallengeSession, MemorySessionStore, SessionStore};
