//! # Wheelspin Core
//!
//! Core traits and types for the wheelspin state synchronization layer.
//!
//! The client keeps a normalized local view of players, tickets and the latest
//! spin, and converges it with the remote services through a strict
//! action → reducer → effect loop.
//!
//! ## Core Concepts
//!
//! - **State**: Normalized, id-keyed domain state
//! - **Action**: Every input to a reducer (intents, successes, failures)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of asynchronous work (never executed by the reducer)
//! - **Environment**: Injected dependencies (gateways) used to build effects
//!
//! ## Example
//!
//! ```ignore
//! use wheelspin_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for TicketReducer {
//!     type State = TicketStore;
//!     type Action = TicketAction;
//!     type Environment = ClientEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TicketStore,
//!         action: TicketAction,
//!         env: &ClientEnvironment,
//!     ) -> SmallVec<[Effect<TicketAction>; 4]> {
//!         // Fold successes into state, turn intents into effects
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer composition
pub mod composition;

/// Effect construction macros
pub mod effect_macros;

/// State transitions
///
/// A reducer never performs I/O; it returns [`Effect`](crate::effect::Effect)
/// values that the runtime executes.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Folds actions into state and describes follow-up work
    pub trait Reducer {
        /// State slice the reducer folds into
        type State;

        /// Actions the reducer accepts
        type Action;

        /// Dependencies effects are built from
        type Environment;

        /// Apply `action` to `state` and return the work it calls for
        ///
        /// Deterministic: the same state and action always produce the same
        /// next state.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of asynchronous work
///
/// A reducer returns effects; the store runs them and feeds any produced
/// action back in.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// One unit of work for the store to run
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Start every child at once
        Parallel(Vec<Effect<Action>>),

        /// Run children one after another, each to completion
        Sequential(Vec<Effect<Action>>),

        /// Dispatch `action` after `duration`
        Delay {
            /// Wait before dispatching
            duration: Duration,
            /// Dispatched once the wait is over
            action: Box<Action>,
        },

        /// Await a computation; a `Some` output is dispatched
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => f.write_str("None"),
                Effect::Parallel(children) => f.debug_tuple("Parallel").field(children).finish(),
                Effect::Sequential(children) => f.debug_tuple("Sequential").field(children).finish(),
                Effect::Delay { duration, action } => f
                    .debug_struct("Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => f.write_str("Future(..)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// True for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

// Re-export the two types every feature module needs
pub use effect::Effect;
pub use reducer::Reducer;
