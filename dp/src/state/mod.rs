//! State management with actor pattern
//!
//! StateManager owns the PlanStore and processes messages via channels,
//! providing serialized access to persisted plan records. The store itself
//! locks its directory, so separate processes can share one store.

mod manager;
mod messages;
mod store;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse, TransitionUpdate};
pub use store::{INTERRUPTED, PlanStore, StoreError};
