//! # Wheelspin Runtime
//!
//! Runtime for the wheelspin state synchronization layer.
//!
//! The [`Store`] is the single dispatch point for a reducer: every action is
//! folded into state under one write lock, and the effects the reducer returns
//! are executed on spawned tokio tasks. Actions produced by effects (gateway
//! successes and failures) are broadcast to observers and fed back through the
//! same dispatch point, so overlapping requests may resolve in any order while
//! reducer execution stays serialized.
//!
//! ## Example
//!
//! ```ignore
//! use wheelspin_runtime::Store;
//!
//! let store = Store::new(AppState::default(), app_reducer(), environment);
//!
//! store.send(AppAction::Player(PlayerAction::ListPlayers)).await?;
//!
//! let roster = store.state(AppState::roster).await;
//! ```

use std::sync::Arc;
use tokio::sync::RwLock;
use wheelspin_core::{effect::Effect, reducer::Reducer};

/// Store failures
pub mod error {
    use thiserror::Error;

    /// Why a store call did not complete
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store no longer accepts actions
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when shutdown gave up
        #[error("shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action, or effects still running, at the deadline
        #[error("timed out waiting for the store")]
        Timeout,

        /// The action broadcast has no sender left
        #[error("action broadcast closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wheelspin_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_poll_interval(Duration::from_millis(10));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// How often `shutdown` re-checks the in-flight effect count
    pub shutdown_poll_interval: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the shutdown poll interval
    #[must_use]
    pub const fn with_shutdown_poll_interval(mut self, interval: Duration) -> Self {
        self.shutdown_poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            shutdown_poll_interval: Duration::from_millis(100),
        }
    }
}

/// How far an [`EffectHandle`] follows the work an action causes
#[derive(Debug, Clone)]
pub enum TrackingMode {
    /// Only the effects returned for the sent action
    Direct,

    /// Also the effects of every action those effects feed back, such as
    /// the ticket refresh that follows a spin
    Cascading {
        /// Handles of fed-back actions that must settle before this one is done
        children: Arc<Mutex<Vec<EffectHandle>>>,
    },
}

impl TrackingMode {
    fn cascading() -> Self {
        Self::Cascading {
            children: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Completion handle for the effects of one sent action
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(AppAction::Ticket(TicketAction::GetTickets { ids })).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// A handle plus the tracking context effects report into
    fn new(mode: TrackingMode) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode: mode.clone(),
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            mode: TrackingMode::Direct,
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Resolve once every tracked effect has finished
    ///
    /// Cascading handles then wait on each adopted child in turn.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }

        if let TrackingMode::Cascading { children } = &self.mode {
            loop {
                let handles = {
                    let mut guard = match children.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if guard.is_empty() {
                        break;
                    }
                    guard.drain(..).collect::<Vec<_>>()
                };

                for mut handle in handles {
                    Box::pin(handle.wait()).await;
                }
            }
        }
    }

    /// [`wait`](Self::wait), bounded by `timeout`
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] when effects are still running at the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Counter shared by the effects of one send
#[derive(Clone)]
struct EffectTracking {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }

    /// A fresh counter for one step of a sequence, under the same mode
    fn step(&self) -> (Self, watch::Receiver<()>) {
        let (notifier, done) = watch::channel(());
        let step = Self {
            mode: self.mode.clone(),
            counter: Arc::new(AtomicUsize::new(0)),
            notifier,
        };
        (step, done)
    }

    /// Resolve once every effect counted here has finished
    async fn settled(&self, done: &mut watch::Receiver<()>) {
        while self.counter.load(Ordering::SeqCst) > 0 {
            if done.changed().await.is_err() {
                break;
            }
        }
    }

    /// Register the handle of a fed-back action (cascading mode only)
    fn adopt(&self, child: EffectHandle) {
        if let TrackingMode::Cascading { children } = &self.mode {
            let mut guard = match children.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.push(child);
        }
    }
}

/// Settles one tracked effect when its task ends, panicking or not
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Settles the store-wide in-flight count
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The store: one dispatch point per reducer
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
        TrackingMode,
    };
    use std::future::Future;
    use tokio::sync::broadcast;

    /// Owns state, reducer and environment, and runs the reducer's effects
    ///
    /// State sits behind an `RwLock` whose write side is the only place
    /// actions are reduced. Clones are handles to the same store.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is
        /// fed back, so callers can wait for the success or failure of an intent.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// A store with the default [`StoreConfig`]
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// A store with explicit configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// A store whose broadcast buffers `capacity` actions for slow observers
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            Self::with_config(
                initial_state,
                reducer,
                environment,
                StoreConfig::default().with_broadcast_capacity(capacity),
            )
        }

        /// Effects running across every send
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Stop accepting actions and wait for running effects to drain
        ///
        /// Calling it again is harmless.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownTimeout`] with the number of effects still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Store shutting down");
            metrics::counter!("store.shutdown.initiated").increment(1);
            self.shutdown.store(true, Ordering::Release);

            let deadline = tokio::time::Instant::now() + timeout;
            let mut pending = self.pending_effects();
            while pending > 0 {
                if tokio::time::Instant::now() >= deadline {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tracing::debug!(pending_effects = pending, "Waiting for effects to drain");
                tokio::time::sleep(self.config.shutdown_poll_interval).await;
                pending = self.pending_effects();
            }

            tracing::info!("Store shut down cleanly");
            metrics::counter!("store.shutdown.completed").increment(1);
            Ok(())
        }

        /// Reduce `action` under the write lock and start its effects
        ///
        /// Returns as soon as the effects are started. Concurrent sends
        /// serialize at the reducer; their effects finish in any order.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            self.send_internal(action, TrackingMode::Direct).await
        }

        /// Send an action and track every effect it transitively causes
        ///
        /// The returned handle only completes once the effects of all
        /// fed-back actions have completed too.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send_cascading")]
        pub async fn send_cascading(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            self.send_internal(action, TrackingMode::cascading()).await
        }

        /// [`send_cascading`](Self::send_cascading), also returning `inspect`
        /// applied to the state the action produced
        ///
        /// `inspect` runs under the same write lock as the reduction, so no
        /// other action can land in between. Callers use it to read what the
        /// reducer recorded for this action, such as an allocated request id.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action, inspect), name = "store_send_cascading_with")]
        pub async fn send_cascading_with<F, T>(
            &self,
            action: A,
            inspect: F,
        ) -> Result<(EffectHandle, T), StoreError>
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            self.send_inspecting(action, TrackingMode::cascading(), inspect).await
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so an
        /// immediately produced result cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let outcome = store.send_and_wait_for(
        ///     AppAction::Player(PlayerAction::ListPlayers),
        ///     |a| matches!(a,
        ///         AppAction::Player(PlayerAction::ListPlayersSucceeded { .. }
        ///             | PlayerAction::ListPlayersFailed { .. })
        ///     ),
        ///     Duration::from_secs(10),
        /// ).await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // A dropped terminal action surfaces as a timeout
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions sent directly via `send` are not broadcast. A receiver
        /// that falls behind gets `RecvError::Lagged` and skips old actions.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        async fn send_internal(
            &self,
            action: A,
            tracking_mode: TrackingMode,
        ) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            let (handle, ()) = self.send_inspecting(action, tracking_mode, |_| ()).await?;
            Ok(handle)
        }

        #[tracing::instrument(skip(self, action, tracking_mode, inspect), name = "store_send_internal")]
        async fn send_inspecting<F, T>(
            &self,
            action: A,
            tracking_mode: TrackingMode,
            inspect: F,
        ) -> Result<(EffectHandle, T), StoreError>
        where
            R: Clone,
            E: Clone,
            F: FnOnce(&S) -> T,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new(tracking_mode);

            let (effects, inspected) = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                #[allow(clippy::cast_precision_loss)] // effect counts are tiny
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                (effects, inspect(&*state))
            };

            tracing::trace!(effects = effects.len(), "Executing effects");
            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok((handle, inspected))
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let player_count = store.state(|s| s.players.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Broadcast an effect-produced action and dispatch it again
        async fn feed_back(&self, action: A, tracking: &EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            let _ = self.action_broadcast.send(action.clone());

            let mode = match tracking.mode {
                TrackingMode::Direct => TrackingMode::Direct,
                TrackingMode::Cascading { .. } => TrackingMode::cascading(),
            };

            match self.send_internal(action, mode).await {
                Ok(child) => tracking.adopt(child),
                Err(error) => tracing::warn!(%error, "Dropped effect-produced action"),
            }
        }

        /// Start one effect under `tracking`
        ///
        /// `Parallel` fans out in place; every other kind runs on its own
        /// task. A panicking effect only takes down its task, and the guards
        /// still settle both counters.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Parallel(children) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for child in children {
                        self.execute_effect_internal(child, tracking.clone());
                    }
                },
                Effect::Future(fut) => self.spawn_tracked("future", tracking, move |store, tracking| async move {
                    match fut.await {
                        Some(action) => store.feed_back(action, &tracking).await,
                        None => tracing::trace!("Future effect finished without an action"),
                    }
                }),
                Effect::Delay { duration, action } => {
                    self.spawn_tracked("delay", tracking, move |store, tracking| async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action, &tracking).await;
                    });
                },
                Effect::Sequential(children) => {
                    self.spawn_tracked("sequential", tracking, move |store, tracking| async move {
                        let steps = children.len();
                        for (step, child) in children.into_iter().enumerate() {
                            tracing::trace!(step = step + 1, of = steps, "Sequential effect");
                            let (step_tracking, mut done) = tracking.step();
                            store.execute_effect_internal(child, step_tracking.clone());
                            step_tracking.settled(&mut done).await;
                        }
                    });
                },
            }
        }

        /// Run `work` on a task counted by both `tracking` and the store
        fn spawn_tracked<F, Fut>(&self, kind: &'static str, tracking: EffectTracking, work: F)
        where
            R: Clone,
            E: Clone,
            F: FnOnce(Self, EffectTracking) -> Fut,
            Fut: Future<Output = ()> + Send + 'static,
        {
            metrics::counter!("store.effects.executed", "type" => kind).increment(1);
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let in_flight = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let task = work(self.clone(), tracking.clone());
            tokio::spawn(async move {
                let _settle = DecrementGuard(tracking);
                let _in_flight = in_flight;
                task.await;
            });
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wheelspin_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

    #[derive(Debug, Clone, Default)]
    struct Pot {
        tickets: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum PotAction {
        Buy,
        Refund,
        Idle,
        FetchOne,
        FetchLater,
        FetchMany,
        Settle,
        Crash,
        /// Slow effect whose feedback starts another slow effect
        Spin,
        Reveal,
    }

    #[derive(Debug, Clone)]
    struct PotReducer;

    fn yields(action: PotAction) -> Effect<PotAction> {
        Effect::Future(Box::pin(async move { Some(action) }))
    }

    fn after(millis: u64, action: PotAction) -> Effect<PotAction> {
        Effect::Future(Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Some(action)
        }))
    }

    impl Reducer for PotReducer {
        type State = Pot;
        type Action = PotAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                PotAction::Buy => state.tickets += 1,
                PotAction::Refund => state.tickets -= 1,
                PotAction::Idle => {},
                PotAction::FetchOne => return smallvec![yields(PotAction::Buy)],
                PotAction::FetchLater => {
                    return smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(PotAction::Buy),
                    }];
                },
                PotAction::FetchMany => {
                    return smallvec![Effect::Parallel(vec![
                        yields(PotAction::Buy),
                        yields(PotAction::Buy),
                        yields(PotAction::Buy),
                    ])];
                },
                PotAction::Settle => {
                    return smallvec![Effect::Sequential(vec![
                        yields(PotAction::Buy),
                        yields(PotAction::Buy),
                        yields(PotAction::Refund),
                    ])];
                },
                PotAction::Crash => {
                    #[allow(clippy::panic)] // exercising panic isolation
                    return smallvec![Effect::Future(Box::pin(async {
                        panic!("effect panicked");
                    }))];
                },
                PotAction::Spin => return smallvec![after(20, PotAction::Reveal)],
                PotAction::Reveal => return smallvec![after(20, PotAction::Buy)],
            }
            smallvec![Effect::None]
        }
    }

    type PotStore = Store<Pot, PotAction, (), PotReducer>;

    fn store() -> PotStore {
        Store::new(Pot::default(), PotReducer, ())
    }

    fn polling_every(millis: u64) -> PotStore {
        Store::with_config(
            Pot::default(),
            PotReducer,
            (),
            StoreConfig::default().with_shutdown_poll_interval(Duration::from_millis(millis)),
        )
    }

    async fn tickets(store: &PotStore) -> i32 {
        store.state(|pot| pot.tickets).await
    }

    #[tokio::test]
    async fn test_send_reduces_before_returning() -> Result<(), StoreError> {
        let store = store();

        store.send(PotAction::Buy).await?;
        assert_eq!(tickets(&store).await, 1);

        store.send(PotAction::Idle).await?;
        assert_eq!(tickets(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_every_effect_kind_feeds_back() -> Result<(), StoreError> {
        for (action, expected) in [
            (PotAction::FetchOne, 1),
            (PotAction::FetchLater, 1),
            (PotAction::FetchMany, 3),
            (PotAction::Settle, 1),
        ] {
            let store = store();
            let mut handle = store.send(action.clone()).await?;
            handle.wait_with_timeout(Duration::from_secs(1)).await?;
            assert_eq!(tickets(&store).await, expected, "after {action:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_delay_is_not_applied_early() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(PotAction::FetchLater).await?;
        assert_eq!(tickets(&store).await, 0);

        handle.wait_with_timeout(Duration::from_secs(1)).await?;
        assert_eq!(tickets(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_sends_serialize() {
        let store = store();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.send(PotAction::Buy).await.is_ok() })
            })
            .collect();

        for task in tasks {
            assert!(matches!(task.await, Ok(true)));
        }
        assert_eq!(tickets(&store).await, 10);
    }

    #[tokio::test]
    async fn test_clones_share_state() -> Result<(), StoreError> {
        let store = store();
        let other = store.clone();

        store.send(PotAction::Buy).await?;
        assert_eq!(tickets(&other).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_panicking_effect_is_contained() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(PotAction::Crash).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        store.send(PotAction::Buy).await?;
        assert_eq!(tickets(&store).await, 1);
        assert_eq!(store.pending_effects(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_direct_handle_stops_at_first_feedback() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(PotAction::Spin).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        // Reveal was applied; its own effect is still sleeping
        assert_eq!(tickets(&store).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cascading_handle_follows_the_chain() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send_cascading(PotAction::Spin).await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        assert_eq!(tickets(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_inspection_sees_the_reduced_state() -> Result<(), StoreError> {
        let store = store();
        store.send(PotAction::Buy).await?;

        let (mut handle, seen) = store
            .send_cascading_with(PotAction::FetchOne, |pot| pot.tickets)
            .await?;
        handle.wait_with_timeout(Duration::from_secs(1)).await?;

        assert_eq!(seen, 1);
        assert_eq!(tickets(&store).await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_handle_needs_no_waiting() -> Result<(), StoreError> {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait_with_timeout(Duration::from_millis(10)).await
    }

    #[tokio::test]
    async fn test_shutdown_rejects_later_sends() {
        let store = store();
        assert!(store.shutdown(Duration::from_secs(1)).await.is_ok());
        assert!(store.shutdown(Duration::from_secs(1)).await.is_ok());

        let result = store.send(PotAction::Buy).await;
        assert_eq!(result.err(), Some(StoreError::ShutdownInProgress));
    }

    #[tokio::test]
    async fn test_shutdown_drains_running_effects() -> Result<(), StoreError> {
        let store = polling_every(5);

        let _handle = store.send(PotAction::FetchLater).await?;
        store.shutdown(Duration::from_secs(1)).await?;

        assert_eq!(store.pending_effects(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_reports_stragglers() -> Result<(), StoreError> {
        let store = polling_every(1);

        let _handle = store.send(PotAction::Spin).await?;
        let result = store.shutdown(Duration::from_millis(5)).await;

        assert!(
            matches!(result, Err(StoreError::ShutdownTimeout(pending)) if pending > 0),
            "got {result:?}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_broadcast_capacity_is_clamped() -> Result<(), StoreError> {
        let store = Store::with_broadcast_capacity(Pot::default(), PotReducer, (), 0);
        store.send(PotAction::Buy).await?;
        assert_eq!(tickets(&store).await, 1);
        assert_eq!(StoreConfig::default().broadcast_capacity, 64);
        Ok(())
    }
}
