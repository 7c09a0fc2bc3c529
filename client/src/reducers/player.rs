use super::immediately;
use crate::actions::{AppAction, PlayerAction};
use crate::environment::ClientEnvironment;
use crate::gateway::validate_name;
use crate::state::AppState;
use crate::types::Operation;
use wheelspin_core::{Effect, Reducer, SmallVec, gateway_effect, smallvec};

/// Folds roster outcomes into the player store
///
/// A list success replaces the whole store; add and update successes
/// overwrite one entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerReducer;

impl PlayerReducer {
    /// Create a new player reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for PlayerReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = ClientEnvironment;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &ClientEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        let AppAction::Player(action) = action else {
            return smallvec![Effect::None];
        };

        match action {
            PlayerAction::ListPlayers => {
                let request_id = state.requests.begin(Operation::ListPlayers);
                smallvec![gateway_effect! {
                    gateway: env.players,
                    call: |players| players.list_players(),
                    on_success: |players| Some(AppAction::Player(PlayerAction::ListPlayersSucceeded {
                        request_id,
                        players,
                    })),
                    on_error: |error| Some(AppAction::Player(PlayerAction::ListPlayersFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            PlayerAction::AddPlayer { name } => {
                let request_id = state.requests.begin(Operation::AddPlayer);
                if let Err(error) = validate_name(&name) {
                    return smallvec![immediately(AppAction::Player(PlayerAction::AddPlayerFailed {
                        request_id,
                        error: error.to_string(),
                    }))];
                }

                smallvec![gateway_effect! {
                    gateway: env.players,
                    call: |players| players.create_player(name),
                    on_success: |player| Some(AppAction::Player(PlayerAction::AddPlayerSucceeded {
                        request_id,
                        player,
                    })),
                    on_error: |error| Some(AppAction::Player(PlayerAction::AddPlayerFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            PlayerAction::UpdatePlayer { player } => {
                let request_id = state.requests.begin(Operation::UpdatePlayer);
                if let Err(error) = validate_name(&player.name) {
                    return smallvec![immediately(AppAction::Player(
                        PlayerAction::UpdatePlayerFailed {
                            request_id,
                            error: error.to_string(),
                        }
                    ))];
                }

                smallvec![gateway_effect! {
                    gateway: env.players,
                    call: |players| players.update_player(player),
                    on_success: |player| Some(AppAction::Player(PlayerAction::UpdatePlayerSucceeded {
                        request_id,
                        player,
                    })),
                    on_error: |error| Some(AppAction::Player(PlayerAction::UpdatePlayerFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            PlayerAction::ListPlayersSucceeded {
                request_id,
                players,
            } => {
                state.players.replace_all(players);
                state.settle(request_id);
                smallvec![Effect::None]
            },

            PlayerAction::AddPlayerSucceeded { request_id, player }
            | PlayerAction::UpdatePlayerSucceeded { request_id, player } => {
                state.players.upsert(player);
                state.settle(request_id);
                smallvec![Effect::None]
            },

            PlayerAction::ListPlayersFailed { request_id, error }
            | PlayerAction::AddPlayerFailed { request_id, error }
            | PlayerAction::UpdatePlayerFailed { request_id, error } => {
                tracing::warn!(%request_id, %error, "player request failed");
                state.fail(request_id, error);
                smallvec![Effect::None]
            },
        }
    }
}
