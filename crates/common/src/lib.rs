//! Shared types used by every debugview crate.

mod types;

pub use types::{EntityId, Transform};
