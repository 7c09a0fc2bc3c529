use super::{accept, observed, validate_name};
use crate::error::GatewayError;
use crate::transport::{AddPlayerRequest, PlayerTransport, UpdatePlayerRequest};
use crate::types::{Operation, Player};
use std::sync::Arc;

const GATEWAY: &str = "player";

/// Player roster operations
#[derive(Clone)]
pub struct PlayerGateway {
    transport: Arc<dyn PlayerTransport>,
}

impl PlayerGateway {
    /// Create a gateway over `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn PlayerTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the complete roster
    ///
    /// # Errors
    ///
    /// Transport or application failure.
    pub async fn list_players(&self) -> Result<Vec<Player>, GatewayError> {
        observed(GATEWAY, Operation::ListPlayers, async {
            let envelope = accept(self.transport.list_players().await)?;
            Ok(envelope.players)
        })
        .await
    }

    /// Create a player; the returned record carries the server-assigned id
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank name, otherwise transport or application
    /// failure, or a success envelope without a player.
    pub async fn create_player(&self, name: String) -> Result<Player, GatewayError> {
        observed(GATEWAY, Operation::AddPlayer, async {
            validate_name(&name)?;
            let envelope = accept(self.transport.add_player(AddPlayerRequest { name }).await)?;
            envelope.player.ok_or(GatewayError::MissingPayload("player"))
        })
        .await
    }

    /// Replace a player's record by id and return the confirmed record
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank name, otherwise transport or application
    /// failure, or a success envelope without a player.
    pub async fn update_player(&self, player: Player) -> Result<Player, GatewayError> {
        observed(GATEWAY, Operation::UpdatePlayer, async {
            validate_name(&player.name)?;
            let envelope =
                accept(self.transport.update_player(UpdatePlayerRequest { player }).await)?;
            envelope.player.ok_or(GatewayError::MissingPayload("player"))
        })
        .await
    }
}

impl std::fmt::Debug for PlayerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerGateway").finish_non_exhaustive()
    }
}
