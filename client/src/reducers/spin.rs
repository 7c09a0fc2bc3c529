use super::immediately;
use crate::actions::{AppAction, SpinAction, TicketAction};
use crate::environment::ClientEnvironment;
use crate::gateway::{validate_participants, validate_spin};
use crate::state::AppState;
use crate::types::Operation;
use wheelspin_core::{Effect, Reducer, SmallVec, gateway_effect, smallvec};

/// Holds the latest spin result
///
/// A result whose winner is outside its pool is never stored, whichever
/// path it arrives by. After a spin the participants' counts have changed
/// on the server, so a successful spin is followed by a ticket refresh.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpinReducer;

impl SpinReducer {
    /// Create a new spin reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for SpinReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = ClientEnvironment;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &ClientEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        let AppAction::Spin(action) = action else {
            return smallvec![Effect::None];
        };

        match action {
            SpinAction::Spin {
                participant_ids,
                mode,
            } => {
                let request_id = state.requests.begin(Operation::Spin);
                if let Err(error) = validate_participants(&participant_ids) {
                    return smallvec![immediately(AppAction::Spin(SpinAction::SpinFailed {
                        request_id,
                        error: error.to_string(),
                    }))];
                }

                smallvec![gateway_effect! {
                    gateway: env.spins,
                    call: |spins| spins.spin_with_mode(participant_ids, mode),
                    on_success: |result| Some(AppAction::Spin(SpinAction::SpinSucceeded {
                        request_id,
                        result,
                    })),
                    on_error: |error| Some(AppAction::Spin(SpinAction::SpinFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            SpinAction::LoadLastSpin => {
                let request_id = state.requests.begin(Operation::LoadLastSpin);
                smallvec![gateway_effect! {
                    gateway: env.spins,
                    call: |spins| spins.get_last_spin(),
                    on_success: |result| Some(AppAction::Spin(SpinAction::LoadLastSpinSucceeded {
                        request_id,
                        result,
                    })),
                    on_error: |error| Some(AppAction::Spin(SpinAction::LoadLastSpinFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            SpinAction::SpinSucceeded { request_id, result } => match validate_spin(result) {
                Ok(result) => {
                    let ids = result.participant_ids.clone();
                    tracing::debug!(%request_id, winner = %result.winner_id, "spin settled");
                    state.spin.record(result);
                    state.settle(request_id);
                    smallvec![immediately(AppAction::Ticket(TicketAction::GetTickets { ids }))]
                },
                Err(error) => {
                    tracing::warn!(%request_id, %error, "spin result rejected");
                    state.fail(request_id, error.to_string());
                    smallvec![Effect::None]
                },
            },

            SpinAction::LoadLastSpinSucceeded { request_id, result } => {
                match validate_spin(result) {
                    Ok(result) => {
                        state.spin.record(result);
                        state.settle(request_id);
                    },
                    Err(error) => state.fail(request_id, error.to_string()),
                }
                smallvec![Effect::None]
            },

            SpinAction::SpinFailed { request_id, error }
            | SpinAction::LoadLastSpinFailed { request_id, error } => {
                tracing::warn!(%request_id, %error, "spin request failed");
                state.fail(request_id, error);
                smallvec![Effect::None]
            },
        }
    }
}
