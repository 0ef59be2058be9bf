//! Reducer for the connection state machine.

use crate::mvi::Reducer;

use super::intent::SessionIntent;
use super::state::ConnectionState;

/// Reducer for connection state transitions.
///
/// Pure function. Releasing the stream, firing callbacks and cancelling the
/// timer are handled by the caller around the dispatch call.
pub struct SessionReducer;

impl Reducer for SessionReducer {
    type State = ConnectionState;
    type Intent = SessionIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            SessionIntent::BeginConnect => match state {
                ConnectionState::Idle => ConnectionState::Connecting,
                other => other,
            },

            SessionIntent::Established => match state {
                ConnectionState::Connecting => ConnectionState::Ready,
                other => other,
            },

            SessionIntent::ConnectFailed(kind) => match state {
                ConnectionState::Connecting => ConnectionState::Failed(kind),
                other => other,
            },

            SessionIntent::Close => ConnectionState::Closed,
        }
    }
}
