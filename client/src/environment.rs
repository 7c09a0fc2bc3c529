//! Injected dependencies of the client reducers

use crate::gateway::{PlayerGateway, SpinGateway, TicketGateway};
use crate::transport::{PlayerTransport, SpinTransport, TicketTransport};
use std::sync::Arc;

/// Gateways the reducers build effects from
///
/// Each gateway sits behind an `Arc` so effects can own a handle without
/// borrowing the environment.
#[derive(Clone, Debug)]
pub struct ClientEnvironment {
    /// Player roster operations
    pub players: Arc<PlayerGateway>,
    /// Ticket count operations
    pub tickets: Arc<TicketGateway>,
    /// Spin resolution
    pub spins: Arc<SpinGateway>,
}

impl ClientEnvironment {
    /// Assemble an environment from gateways
    #[must_use]
    pub const fn new(
        players: Arc<PlayerGateway>,
        tickets: Arc<TicketGateway>,
        spins: Arc<SpinGateway>,
    ) -> Self {
        Self {
            players,
            tickets,
            spins,
        }
    }

    /// Build all three gateways over one transport
    #[must_use]
    pub fn from_transport<T>(transport: Arc<T>) -> Self
    where
        T: PlayerTransport + TicketTransport + SpinTransport + 'static,
    {
        let players: Arc<dyn PlayerTransport> = transport.clone();
        let tickets: Arc<dyn TicketTransport> = transport.clone();
        let spins: Arc<dyn SpinTransport> = transport;

        Self::new(
            Arc::new(PlayerGateway::new(players)),
            Arc::new(TicketGateway::new(tickets)),
            Arc::new(SpinGateway::new(spins)),
        )
    }
}
