//! Connection setup and live shell sessions.
//!
//! # Architecture
//!
//! Uses MVI (Model-View-Intent) for the connection state:
//! - `state.rs` - `Idle → Connecting → Ready → Closed`, or `Failed(kind)`
//! - `intent.rs` - Caller actions and transport events
//! - `reducer.rs` - State transitions (pure, no side effects)
//!
//! Around it:
//! - `manager.rs` - connect + timeout race, one attempt per manager
//! - `timer.rs` - cancellable connect timer
//! - `shell.rs` - actor owning the shell stream

mod intent;
mod manager;
mod reducer;
mod shell;
mod state;
mod timer;

pub use intent::SessionIntent;
pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
pub use reducer::SessionReducer;
pub use shell::{EndedCallback, OutputCallback, ShellSession};
pub use state::ConnectionState;
pub use timer::ConnectTimer;
