use super::{accept, observed, validate_ids, validate_tickets};
use crate::error::GatewayError;
use crate::transport::{IncrementTicketsRequest, SetTicketsRequest, TicketIdsQuery, TicketTransport};
use crate::types::{Operation, PlayerId, Ticket};
use std::sync::Arc;

const GATEWAY: &str = "ticket";

/// Ticket count operations
///
/// Increment (relative) and set (absolute) stay separate calls so a caller
/// cannot zero a count by picking the wrong parameter.
#[derive(Clone)]
pub struct TicketGateway {
    transport: Arc<dyn TicketTransport>,
}

impl TicketGateway {
    /// Create a gateway over `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn TicketTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the counts of `ids`; unknown ids are absent from the result
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty id set, otherwise transport or
    /// application failure.
    pub async fn get_tickets(&self, ids: Vec<PlayerId>) -> Result<Vec<Ticket>, GatewayError> {
        observed(GATEWAY, Operation::GetTickets, async {
            validate_ids(&ids)?;
            let envelope = accept(self.transport.get_tickets(TicketIdsQuery::new(&ids)).await)?;
            Ok(envelope.tickets)
        })
        .await
    }

    /// Add the server's fixed step to each of `ids` and return the new counts
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty id set, otherwise transport or
    /// application failure.
    pub async fn increment_tickets(&self, ids: Vec<PlayerId>) -> Result<Vec<Ticket>, GatewayError> {
        observed(GATEWAY, Operation::IncrementTickets, async {
            validate_ids(&ids)?;
            let request = IncrementTicketsRequest::new(&ids);
            let envelope = accept(self.transport.increment_tickets(request).await)?;
            Ok(envelope.tickets)
        })
        .await
    }

    /// Overwrite the listed counts and return the confirmed values
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty list, otherwise transport or
    /// application failure.
    pub async fn set_tickets(&self, tickets: Vec<Ticket>) -> Result<Vec<Ticket>, GatewayError> {
        observed(GATEWAY, Operation::SetTickets, async {
            validate_tickets(&tickets)?;
            let envelope = accept(self.transport.set_tickets(SetTicketsRequest { tickets }).await)?;
            Ok(envelope.tickets)
        })
        .await
    }
}

impl std::fmt::Debug for TicketGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketGateway").finish_non_exhaustive()
    }
}
