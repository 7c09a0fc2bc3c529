//! Reducer composition
//!
//! Feature reducers (players, tickets, spins) each own one slice of the
//! application state and ignore actions that are not theirs.
//! [`combine_reducers`] runs them in order against the same state and action,
//! concatenating their effects.
//!
//! # Example
//!
//! ```
//! use wheelspin_core::{Effect, Reducer, SmallVec, smallvec};
//! use wheelspin_core::composition::{combine_reducers, SharedReducer};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Default)]
//! struct Raffle {
//!     names: Vec<String>,
//!     tickets: u32,
//! }
//!
//! #[derive(Clone)]
//! enum RaffleAction {
//!     Join(String),
//!     BuyTicket,
//! }
//!
//! struct Roster;
//! struct Tickets;
//!
//! impl Reducer for Roster {
//!     type State = Raffle;
//!     type Action = RaffleAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Raffle, action: RaffleAction, _env: &()) -> SmallVec<[Effect<RaffleAction>; 4]> {
//!         if let RaffleAction::Join(name) = action {
//!             state.names.push(name);
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for Tickets {
//!     type State = Raffle;
//!     type Action = RaffleAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Raffle, action: RaffleAction, _env: &()) -> SmallVec<[Effect<RaffleAction>; 4]> {
//!         if matches!(action, RaffleAction::BuyTicket) {
//!             state.tickets += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let slices: Vec<SharedReducer<Raffle, RaffleAction, ()>> = vec![Arc::new(Roster), Arc::new(Tickets)];
//! let raffle = combine_reducers(slices);
//!
//! let mut state = Raffle::default();
//! let effects = raffle.reduce(&mut state, RaffleAction::Join("Ann".to_string()), &());
//! assert_eq!(state.names, ["Ann"]);
//! assert_eq!(state.tickets, 0);
//! assert!(effects.is_empty());
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// A reducer behind an `Arc`, shareable across stores and clones
pub type SharedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Run `reducers` in order over the same state, collecting their effects
///
/// `Effect::None` is dropped from the combined output, so an action no slice
/// reacts to yields no effects at all.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<SharedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { slices: reducers }
}

/// Reducer built by [`combine_reducers`]
///
/// Clones share the underlying slices.
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    slices: Vec<SharedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of slices
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// True when nothing was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<S, A, E> Clone for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn clone(&self) -> Self {
        Self {
            slices: self.slices.clone(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.slices
            .iter()
            .flat_map(|slice| slice.reduce(state, action.clone(), env))
            .filter(|effect| !effect.is_none())
            .collect()
    }
}
