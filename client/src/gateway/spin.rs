use super::{accept, observed, validate_participants, validate_spin};
use crate::error::GatewayError;
use crate::transport::{SpinRequest, SpinTransport};
use crate::types::{Operation, PlayerId, SpinMode, SpinResult, ids_csv};
use std::sync::Arc;

const GATEWAY: &str = "spin";

/// Spin resolution
///
/// The winner is drawn remotely; this gateway only checks that it came from
/// the submitted pool.
#[derive(Clone)]
pub struct SpinGateway {
    transport: Arc<dyn SpinTransport>,
}

impl SpinGateway {
    /// Create a gateway over `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn SpinTransport>) -> Self {
        Self { transport }
    }

    /// Ticket-weighted spin among `participant_ids`
    ///
    /// # Errors
    ///
    /// See [`SpinGateway::spin_with_mode`].
    pub async fn spin(&self, participant_ids: Vec<PlayerId>) -> Result<SpinResult, GatewayError> {
        self.spin_with_mode(participant_ids, SpinMode::Weighted).await
    }

    /// Spin where every participant has the same chance
    ///
    /// # Errors
    ///
    /// See [`SpinGateway::spin_with_mode`].
    pub async fn spin_unweighted(
        &self,
        participant_ids: Vec<PlayerId>,
    ) -> Result<SpinResult, GatewayError> {
        self.spin_with_mode(participant_ids, SpinMode::Unweighted).await
    }

    /// Submit a pool and return the validated result
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty pool, `PoolMismatch` when the result
    /// does not echo the submitted ids in order, `InvalidSpin` when the
    /// winner is not among them, otherwise transport or application failure.
    pub async fn spin_with_mode(
        &self,
        participant_ids: Vec<PlayerId>,
        mode: SpinMode,
    ) -> Result<SpinResult, GatewayError> {
        observed(GATEWAY, Operation::Spin, async {
            validate_participants(&participant_ids)?;
            let submitted = participant_ids.clone();

            let envelope = accept(
                self.transport
                    .spin(SpinRequest::new(participant_ids, mode))
                    .await,
            )?;
            let result = envelope.result.ok_or(GatewayError::MissingPayload("result"))?;

            if result.participant_ids != submitted {
                return Err(GatewayError::PoolMismatch {
                    submitted: ids_csv(&submitted),
                    returned: ids_csv(&result.participant_ids),
                });
            }
            validate_spin(result)
        })
        .await
    }

    /// The most recent spin, without resolving a new one
    ///
    /// # Errors
    ///
    /// Transport or application failure (the server reports an error when
    /// no spin has happened yet), or an invalid stored result.
    pub async fn get_last_spin(&self) -> Result<SpinResult, GatewayError> {
        observed(GATEWAY, Operation::LoadLastSpin, async {
            let envelope = accept(self.transport.last_spin().await)?;
            validate_spin(envelope.result.ok_or(GatewayError::MissingPayload("result"))?)
        })
        .await
    }
}

impl std::fmt::Debug for SpinGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryTransport;
    use crate::transport::{SpinEnvelope, TransportFuture};
    use crate::types::{Player, Ticket};

    fn setup() -> (Arc<InMemoryTransport>, SpinGateway) {
        let transport = Arc::new(
            InMemoryTransport::new()
                .with_players((1..=3).map(|id| Player::new(PlayerId(id), format!("p{id}"))))
                .with_tickets([Ticket::new(PlayerId(2), 4)]),
        );
        let gateway = SpinGateway::new(Arc::clone(&transport) as Arc<dyn SpinTransport>);
        (transport, gateway)
    }

    #[tokio::test]
    async fn test_winner_in_pool_is_accepted() {
        let (_, spins) = setup();
        let ids = vec![PlayerId(1), PlayerId(2), PlayerId(3)];

        let result = spins.spin(ids.clone()).await.unwrap();

        assert_eq!(result.participant_ids, ids);
        assert_eq!(result.winner_id, PlayerId(2));
    }

    #[tokio::test]
    async fn test_winner_outside_pool_is_rejected() {
        let (transport, spins) = setup();
        transport.force_winner(PlayerId(9));

        let error = spins
            .spin(vec![PlayerId(1), PlayerId(2), PlayerId(3)])
            .await
            .unwrap_err();

        assert_eq!(
            error,
            GatewayError::InvalidSpin {
                winner: PlayerId(9),
                participants: "1,2,3".to_string(),
            }
        );
    }

    /// Answers every spin with the same result
    struct FixedSpin(SpinResult);

    impl SpinTransport for FixedSpin {
        fn spin(&self, _request: SpinRequest) -> TransportFuture<'_, SpinEnvelope> {
            let envelope = SpinEnvelope::ok(self.0.clone());
            Box::pin(async move { Ok(envelope) })
        }

        fn last_spin(&self) -> TransportFuture<'_, SpinEnvelope> {
            let envelope = SpinEnvelope::ok(self.0.clone());
            Box::pin(async move { Ok(envelope) })
        }
    }

    #[tokio::test]
    async fn test_reshaped_pool_is_rejected() {
        let spins = SpinGateway::new(Arc::new(FixedSpin(SpinResult {
            participant_ids: vec![PlayerId(2), PlayerId(1)],
            winner_id: PlayerId(2),
        })));

        let error = spins.spin(vec![PlayerId(1), PlayerId(2)]).await.unwrap_err();

        assert_eq!(
            error,
            GatewayError::PoolMismatch {
                submitted: "1,2".to_string(),
                returned: "2,1".to_string(),
            }
        );
        assert_eq!(
            error.to_string(),
            "invalid spin result: participants [2,1] differ from submitted [1,2]"
        );
    }

    #[tokio::test]
    async fn test_empty_pool_is_a_failure() {
        let (transport, spins) = setup();

        let error = spins.spin_unweighted(vec![]).await.unwrap_err();

        assert!(matches!(error, GatewayError::InvalidRequest(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_last_spin_before_any_spin() {
        let (_, spins) = setup();

        let error = spins.get_last_spin().await.unwrap_err();

        assert_eq!(error, GatewayError::Application("no spin yet to return".to_string()));
    }

    #[tokio::test]
    async fn test_last_spin_returns_latest() {
        let (_, spins) = setup();
        let first = spins.spin(vec![PlayerId(1), PlayerId(2)]).await.unwrap();

        assert_eq!(spins.get_last_spin().await.unwrap(), first);
    }
}
