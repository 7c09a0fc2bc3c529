//! # Wheelspin Testing
//!
//! Testing utilities for reducers and stores.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for pure reducers
//! - [`assertions`]: effect shape assertions
//! - [`helpers`]: resolving effect descriptions into the actions they produce,
//!   and waiting on store state
//!
//! ## Example
//!
//! ```ignore
//! use wheelspin_testing::helpers::resolve_effects;
//!
//! #[tokio::test]
//! async fn list_players_resolves_to_success() {
//!     let env = scripted_environment();
//!     let mut state = AppState::default();
//!
//!     let effects = reducer.reduce(&mut state, list_players(), &env);
//!     let produced = resolve_effects(effects.into_vec()).await;
//!
//!     assert!(matches!(produced[..], [AppAction::Player(PlayerAction::ListPlayersSucceeded { .. })]));
//! }
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Helpers for driving effects and stores in async tests
pub mod helpers {
    use futures::future::BoxFuture;
    use std::time::Duration;
    use wheelspin_core::{effect::Effect, reducer::Reducer};
    use wheelspin_runtime::Store;

    /// Execute effect descriptions without a store and collect the actions
    /// they produce
    ///
    /// `Parallel` and `Sequential` children are resolved in order, `Delay`
    /// yields its action without sleeping, and a `Future` that resolves to
    /// `None` contributes nothing.
    pub fn resolve_effects<A>(effects: Vec<Effect<A>>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        Box::pin(async move {
            let mut produced = Vec::new();
            for effect in effects {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => produced.extend(fut.await),
                    Effect::Delay { action, .. } => produced.push(*action),
                    Effect::Parallel(children) | Effect::Sequential(children) => {
                        produced.extend(resolve_effects(children).await);
                    },
                }
            }
            produced
        })
    }

    /// Poll store state until `predicate` holds or `timeout` elapses
    ///
    /// Returns whether the predicate was eventually satisfied.
    pub async fn wait_for_state<S, A, E, R, F>(
        store: &Store<S, A, E, R>,
        predicate: F,
        timeout: Duration,
    ) -> bool
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: Fn(&S) -> bool,
    {
        let poll = async {
            loop {
                if store.state(&predicate).await {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }
}
