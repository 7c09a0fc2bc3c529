//! Wire contracts for the players, tickets and spin services
//!
//! Every response envelope carries its payload next to an `error` string.
//! An empty or absent `error` means success. A transport can fail in two
//! independent ways: the call itself fails ([`TransportError`]), or it
//! succeeds with a non-empty `error` field. Gateways check both.
//!
//! The traits here are the only thing gateways know about the network, so
//! tests swap in [`crate::mocks::InMemoryTransport`] and the binary uses
//! [`crate::http::HttpTransport`].

use crate::error::TransportError;
use crate::types::{Player, PlayerId, SpinMode, SpinResult, Ticket, ids_csv};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by transport calls
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// A response envelope with the dual-channel error convention
pub trait Envelope: Sized {
    /// The application error, if the server reported one
    fn application_error(&self) -> Option<&str>;

    /// An envelope with no payload and `message` as its error
    fn rejected(message: impl Into<String>) -> Self;
}

fn non_empty(error: Option<&String>) -> Option<&str> {
    error.map(String::as_str).filter(|message| !message.is_empty())
}

macro_rules! envelope {
    ($name:ident, $doc:literal, $field:ident: $payload:ty) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Payload; absent when `error` is set
            #[serde(default)]
            pub $field: $payload,
            /// Application error; empty or absent on success
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub error: Option<String>,
        }

        impl Envelope for $name {
            fn application_error(&self) -> Option<&str> {
                non_empty(self.error.as_ref())
            }

            fn rejected(message: impl Into<String>) -> Self {
                Self {
                    error: Some(message.into()),
                    ..Self::default()
                }
            }
        }
    };
}

envelope!(PlayersEnvelope, "`{players, error}`", players: Vec<Player>);
envelope!(PlayerEnvelope, "`{player, error}`", player: Option<Player>);
envelope!(TicketsEnvelope, "`{tickets, error}`", tickets: Vec<Ticket>);
envelope!(SpinEnvelope, "`{result, error}`", result: Option<SpinResult>);

impl PlayersEnvelope {
    /// A successful roster response
    #[must_use]
    pub const fn ok(players: Vec<Player>) -> Self {
        Self {
            players,
            error: None,
        }
    }
}

impl PlayerEnvelope {
    /// A successful single-player response
    #[must_use]
    pub const fn ok(player: Player) -> Self {
        Self {
            player: Some(player),
            error: None,
        }
    }
}

impl TicketsEnvelope {
    /// A successful ticket response
    #[must_use]
    pub const fn ok(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets,
            error: None,
        }
    }
}

impl SpinEnvelope {
    /// A successful spin response
    #[must_use]
    pub const fn ok(result: SpinResult) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }
}

/// Body of a non-2xx response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable error
    #[serde(default)]
    pub error: String,
}

/// `POST /players`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPlayerRequest {
    /// Name of the new player
    pub name: String,
}

/// `PUT /players`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlayerRequest {
    /// Full replacement record, matched by id
    pub player: Player,
}

/// Query of `GET /tickets`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketIdsQuery {
    /// Comma-separated ids
    pub ids: String,
}

impl TicketIdsQuery {
    /// Encode an id set
    #[must_use]
    pub fn new(ids: &[PlayerId]) -> Self {
        Self { ids: ids_csv(ids) }
    }
}

/// `POST /tickets/increment`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementTicketsRequest {
    /// Comma-separated ids
    pub ids: String,
}

impl IncrementTicketsRequest {
    /// Encode an id set
    #[must_use]
    pub fn new(ids: &[PlayerId]) -> Self {
        Self { ids: ids_csv(ids) }
    }
}

/// `PUT /tickets`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTicketsRequest {
    /// Absolute counts to store
    pub tickets: Vec<Ticket>,
}

/// `POST /spin`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinRequest {
    /// Candidate pool, order preserved
    pub participant_ids: Vec<PlayerId>,
    /// Ask the resolver to ignore ticket weights
    #[serde(default)]
    pub unweighted: bool,
}

impl SpinRequest {
    /// Build a request for `mode`
    #[must_use]
    pub fn new(participant_ids: Vec<PlayerId>, mode: SpinMode) -> Self {
        Self {
            participant_ids,
            unweighted: mode.is_unweighted(),
        }
    }
}

/// Players resource
pub trait PlayerTransport: Send + Sync {
    /// `GET /players`
    fn list_players(&self) -> TransportFuture<'_, PlayersEnvelope>;

    /// `POST /players`
    fn add_player(&self, request: AddPlayerRequest) -> TransportFuture<'_, PlayerEnvelope>;

    /// `PUT /players`
    fn update_player(&self, request: UpdatePlayerRequest) -> TransportFuture<'_, PlayerEnvelope>;
}

/// Tickets resource
pub trait TicketTransport: Send + Sync {
    /// `GET /tickets?ids=csv`
    fn get_tickets(&self, query: TicketIdsQuery) -> TransportFuture<'_, TicketsEnvelope>;

    /// `POST /tickets/increment`
    fn increment_tickets(
        &self,
        request: IncrementTicketsRequest,
    ) -> TransportFuture<'_, TicketsEnvelope>;

    /// `PUT /tickets`
    fn set_tickets(&self, request: SetTicketsRequest) -> TransportFuture<'_, TicketsEnvelope>;
}

/// Spin resource
pub trait SpinTransport: Send + Sync {
    /// `POST /spin`
    fn spin(&self, request: SpinRequest) -> TransportFuture<'_, SpinEnvelope>;

    /// `GET /get-last-spin`
    fn last_spin(&self) -> TransportFuture<'_, SpinEnvelope>;
}
