//! Admin operations on B2C users.
//!
//! The projector turns API models into directory requests and carries the
//! custom `Role` attribute on the entity's extension side channel.

pub mod projector;

pub use projector::{B2cSettings, UserProjector};
