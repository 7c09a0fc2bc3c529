//! Domain gateways
//!
//! A gateway turns one domain operation into one transport call and folds
//! both failure channels (transport error, non-empty `error` field) into a
//! single [`GatewayError`]. Gateways never retry.

mod player;
mod spin;
mod ticket;

pub use player::PlayerGateway;
pub use spin::SpinGateway;
pub use ticket::TicketGateway;

use crate::error::{GatewayError, TransportError};
use crate::transport::Envelope;
use crate::types::{Operation, PlayerId, SpinResult, Ticket, ids_csv};
use std::future::Future;

/// Reject names that are empty after trimming
///
/// # Errors
///
/// Returns `GatewayError::InvalidRequest` for a blank name.
pub fn validate_name(name: &str) -> Result<(), GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "player name must not be blank".to_string(),
        ));
    }
    Ok(())
}

/// Reject an empty id set
///
/// # Errors
///
/// Returns `GatewayError::InvalidRequest` when `ids` is empty.
pub fn validate_ids(ids: &[PlayerId]) -> Result<(), GatewayError> {
    if ids.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "at least one player id is required".to_string(),
        ));
    }
    Ok(())
}

/// Reject an empty ticket list
///
/// # Errors
///
/// Returns `GatewayError::InvalidRequest` when `tickets` is empty.
pub fn validate_tickets(tickets: &[Ticket]) -> Result<(), GatewayError> {
    if tickets.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "at least one ticket count is required".to_string(),
        ));
    }
    Ok(())
}

/// Reject an empty spin pool
///
/// # Errors
///
/// Returns `GatewayError::InvalidRequest` when `participant_ids` is empty.
pub fn validate_participants(participant_ids: &[PlayerId]) -> Result<(), GatewayError> {
    if participant_ids.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "a spin needs at least one participant".to_string(),
        ));
    }
    Ok(())
}

/// Accept a spin result only if its winner is one of its participants
///
/// # Errors
///
/// Returns `GatewayError::InvalidSpin` naming the winner and the pool.
pub fn validate_spin(result: SpinResult) -> Result<SpinResult, GatewayError> {
    if result.is_valid() {
        Ok(result)
    } else {
        Err(GatewayError::InvalidSpin {
            winner: result.winner_id,
            participants: ids_csv(&result.participant_ids),
        })
    }
}

/// Fold the two failure channels of a transport call into one
fn accept<E: Envelope>(response: Result<E, TransportError>) -> Result<E, GatewayError> {
    let envelope = response?;
    match envelope.application_error() {
        Some(message) => Err(GatewayError::Application(message.to_string())),
        None => Ok(envelope),
    }
}

/// Run one gateway call, logging and counting its outcome
async fn observed<T, F>(gateway: &'static str, operation: Operation, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    let result = call.await;

    let outcome = match &result {
        Ok(_) => {
            tracing::debug!(gateway, %operation, "gateway call succeeded");
            "ok"
        },
        Err(error) => {
            tracing::warn!(gateway, %operation, %error, "gateway call failed");
            match error {
                GatewayError::Transport(_) => "transport_error",
                GatewayError::Application(_) => "application_error",
                GatewayError::InvalidRequest(_) => "invalid_request",
                GatewayError::InvalidSpin { .. }
                | GatewayError::PoolMismatch { .. }
                | GatewayError::MissingPayload(_) => "invalid_response",
            }
        },
    };

    metrics::counter!(
        "gateway.calls.total",
        "gateway" => gateway,
        "operation" => operation.as_str(),
        "outcome" => outcome,
    )
    .increment(1);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PlayersEnvelope;

    #[test]
    fn test_accept_transport_failure() {
        let response: Result<PlayersEnvelope, _> = Err(TransportError::Timeout {
            route: "GET /players",
        });
        assert!(matches!(accept(response), Err(GatewayError::Transport(_))));
    }

    #[test]
    fn test_accept_application_failure() {
        let response = Ok(PlayersEnvelope::rejected("boom"));
        assert_eq!(accept(response), Err(GatewayError::Application("boom".to_string())));
    }

    #[test]
    fn test_accept_success() {
        let response = Ok(PlayersEnvelope::ok(vec![]));
        assert_eq!(accept(response), Ok(PlayersEnvelope::ok(vec![])));
    }

    #[test]
    fn test_validation() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name("Ann").is_ok());
        assert!(validate_ids(&[]).is_err());
        assert!(validate_ids(&[PlayerId(1)]).is_ok());
        assert!(validate_tickets(&[]).is_err());
        assert!(validate_participants(&[]).is_err());
    }

    #[test]
    fn test_validate_spin() {
        let ok = SpinResult {
            participant_ids: vec![PlayerId(1), PlayerId(2), PlayerId(3)],
            winner_id: PlayerId(2),
        };
        assert_eq!(validate_spin(ok.clone()), Ok(ok));

        let outside = SpinResult {
            participant_ids: vec![PlayerId(1), PlayerId(2), PlayerId(3)],
            winner_id: PlayerId(9),
        };
        assert_eq!(
            validate_spin(outside),
            Err(GatewayError::InvalidSpin {
                winner: PlayerId(9),
                participants: "1,2,3".to_string(),
            })
        );
    }
}
