//! Base trait for intents.

/// Marker trait for intent objects.
///
/// Intents represent:
/// - Caller actions (connect, close)
/// - Transport events (shell opened, stream ended)
/// - Timer expiry
///
/// Intents are processed by reducers to produce new states.
pub trait Intent: Send + 'static {}
