//! # Wheelspin Client
//!
//! State synchronization layer for the wheelspin raffle service: a
//! normalized local view of players, ticket counts and the latest spin,
//! kept consistent with the remote services through intent, success and
//! failure actions.
//!
//! ## Layers
//!
//! - [`transport`]: wire contracts; [`http`] implements them over HTTP
//! - [`gateway`]: domain operations over a transport, with validation
//! - [`actions`]: the triads of every remote operation
//! - [`state`] and [`reducers`]: pure folds of actions into state
//! - [`dispatch`]: send an intent and wait for its outcome
//!
//! ## Example
//!
//! ```ignore
//! use wheelspin_client::{client_store, dispatch::dispatch, ClientConfig, ClientEnvironment};
//! use wheelspin_client::http::HttpTransport;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env()?;
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let store = client_store(ClientEnvironment::from_transport(transport));
//!
//! let outcome = dispatch(&store, AppAction::Player(PlayerAction::ListPlayers), config.action_timeout).await?;
//! ```

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod http;
pub mod mocks;
pub mod reducers;
pub mod state;
pub mod transport;
pub mod types;

pub use actions::{AppAction, PlayerAction, SpinAction, TicketAction};
pub use config::ClientConfig;
pub use environment::ClientEnvironment;
pub use error::{ConfigError, DispatchError, GatewayError, TransportError};
pub use reducers::{AppReducer, app_reducer};
pub use state::AppState;
pub use types::{Operation, Player, PlayerId, RequestId, SpinMode, SpinResult, Ticket};

use wheelspin_runtime::Store;

/// The store type the client runs
pub type ClientStore = Store<AppState, AppAction, ClientEnvironment, AppReducer>;

/// A store with empty state over `environment`
#[must_use]
pub fn client_store(environment: ClientEnvironment) -> ClientStore {
    Store::new(AppState::default(), app_reducer(), environment)
}
