//! Microsoft Graph directory access.
//!
//! Provides the `DirectoryService` seam used by user operations, its
//! reqwest-backed Graph implementation, and the client-credentials token
//! source that authenticates it.

pub mod client;
pub mod directory;
pub mod token;

pub use client::GraphDirectory;
pub use directory::{DirectoryService, PageRequest};
pub use token::ClientCredentials;
