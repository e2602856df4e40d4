//! Collaborator seams for logroll.
//!
//! The producer and worker never talk to AWS directly; they go through:
//! - [`ObjectStore`] - Listing, download, upload, batch delete, bucket region
//! - [`MessageQueue`] - Send, receive and delete raw messages
//! - [`SessionProvider`] - Role-scoped object store sessions
//!
//! The [`memory`] module provides in-memory implementations of all three for
//! tests and local development.

pub mod memory;
mod queue;
mod session;
mod store;

pub use queue::{MessageQueue, RawMessage};
pub use session::{RoleSession, SessionProvider};
pub use store::{DeleteFailure, DeleteReport, ListPage, Listing, ObjectStore};
