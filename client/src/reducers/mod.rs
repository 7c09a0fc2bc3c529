//! Feature reducers and their composition
//!
//! Each feature reducer handles its own slice of [`AppAction`] and ignores
//! the rest. An intent allocates a request id and returns one effect that
//! resolves to exactly one success or failure carrying that id. Intents that
//! fail validation resolve to their failure immediately, without touching a
//! gateway, so waiters observe them like any other outcome.

mod player;
mod spin;
mod ticket;

pub use player::PlayerReducer;
pub use spin::SpinReducer;
pub use ticket::TicketReducer;

use crate::actions::AppAction;
use crate::environment::ClientEnvironment;
use crate::state::AppState;
use std::sync::Arc;
use wheelspin_core::composition::{CombinedReducer, SharedReducer, combine_reducers};
use wheelspin_core::{Effect, async_effect};

/// The reducer the client store runs
pub type AppReducer = CombinedReducer<AppState, AppAction, ClientEnvironment>;

/// Players, tickets and spins combined
#[must_use]
pub fn app_reducer() -> AppReducer {
    let reducers: Vec<SharedReducer<AppState, AppAction, ClientEnvironment>> = vec![
        Arc::new(PlayerReducer::new()),
        Arc::new(TicketReducer::new()),
        Arc::new(SpinReducer::new()),
    ];
    combine_reducers(reducers)
}

/// An effect that yields `action` as soon as it runs
fn immediately(action: AppAction) -> Effect<AppAction> {
    async_effect! { Some(action) }
}
