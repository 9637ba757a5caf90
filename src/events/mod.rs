//! Change notification for the sync store
//!
//! This module provides:
//! - `Topic`: the named event channels subscribers register against
//! - `SyncEvent`: an event emitted after every store mutation
//! - `EventBus`: synchronous topic listeners plus a broadcast stream
//!   for WebSocket clients

mod bus;
mod types;

pub use bus::{EventBus, Listener, Subscription};
pub use types::{SyncEvent, Topic, UnknownTopic};
