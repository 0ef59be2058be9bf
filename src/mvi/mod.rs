//! Model-View-Intent (MVI) primitives.
//!
//! Session state changes flow in one direction:
//!
//! ```text
//! Intent ──→ Reducer ──→ State
//!    ↑                     │
//!    └──── observers ──────┘
//! ```
//!
//! - **State**: Immutable snapshot of a state machine
//! - **Intent**: Caller actions or transport events
//! - **Reducer**: Pure function that transforms state based on intents

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::State;
