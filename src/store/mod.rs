//! Synchronized in-memory store
//!
//! [`SyncStore`] owns every collection and publishes a [`crate::events::SyncEvent`]
//! for each change. Reads return owned snapshots.

mod collection;
mod error;
mod seed;
mod stats;
mod sync;

pub use collection::{Collection, KeyedLists};
pub use error::{StoreError, StoreResult};
pub use seed::SeedData;
pub use stats::{AdminStats, ApplicantStats, Stats};
pub use sync::{SyncStore, SyncSummary};
