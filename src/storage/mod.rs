//! Storage module — confined, atomic writes under the storage root.

pub mod fs;

pub use fs::{Storage, WrittenFile};
