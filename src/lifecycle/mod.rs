//! Binding sessions to the lifetime of their owner.
//!
//! - `signal.rs` - owner-gone flag and drop guard
//! - `coordinator.rs` - exactly-once teardown of a pending connect or a
//!   bound session

mod coordinator;
mod signal;

pub use coordinator::LifecycleCoordinator;
pub use signal::{OwnerGuard, OwnerSignal};
