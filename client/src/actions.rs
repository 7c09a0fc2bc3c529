//! Action vocabulary
//!
//! Every remote operation is a triad: the intent (request parameters), its
//! success (confirmed result) and its failure (error text). Intents carry no
//! request id; the reducer assigns one when it starts the request and the
//! outcome carries it back.

use crate::types::{Operation, Player, PlayerId, RequestId, SpinMode, SpinResult, Ticket};
use wheelspin_macros::Action;

/// Player roster actions
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// Fetch the full roster
    #[intent]
    ListPlayers,

    /// The roster as the server returned it
    #[success]
    ListPlayersSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Complete roster
        players: Vec<Player>,
    },

    /// Roster fetch failed
    #[failure]
    ListPlayersFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },

    /// Create a player named `name`
    #[intent]
    AddPlayer {
        /// Requested name
        name: String,
    },

    /// The server accepted a new player
    #[success]
    AddPlayerSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Server record, including the assigned id
        player: Player,
    },

    /// Creating a player failed
    #[failure]
    AddPlayerFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },

    /// Replace a player's record by id
    #[intent]
    UpdatePlayer {
        /// Full replacement record
        player: Player,
    },

    /// The server confirmed the update
    #[success]
    UpdatePlayerSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Confirmed record
        player: Player,
    },

    /// Updating a player failed
    #[failure]
    UpdatePlayerFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },
}

/// Ticket count actions
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum TicketAction {
    /// Fetch the counts of `ids`
    #[intent]
    GetTickets {
        /// Ids to look up
        ids: Vec<PlayerId>,
    },

    /// Counts for the known subset of the requested ids
    #[success]
    GetTicketsSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Returned counts
        tickets: Vec<Ticket>,
    },

    /// Fetching counts failed
    #[failure]
    GetTicketsFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },

    /// Add one step to each of `ids`
    #[intent]
    IncrementTickets {
        /// Ids to increment
        ids: Vec<PlayerId>,
    },

    /// New counts after the increment
    #[success]
    IncrementTicketsSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Returned counts
        tickets: Vec<Ticket>,
    },

    /// Incrementing failed
    #[failure]
    IncrementTicketsFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },

    /// Overwrite the listed counts
    #[intent]
    SetTickets {
        /// Absolute counts
        tickets: Vec<Ticket>,
    },

    /// Confirmed counts after the overwrite
    #[success]
    SetTicketsSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// Returned counts
        tickets: Vec<Ticket>,
    },

    /// Overwriting failed
    #[failure]
    SetTicketsFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },
}

/// Spin actions
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum SpinAction {
    /// Resolve a spin among `participant_ids`
    #[intent]
    Spin {
        /// Candidate pool, in display order
        participant_ids: Vec<PlayerId>,
        /// Weighted by tickets or not
        mode: SpinMode,
    },

    /// A validated spin result
    #[success]
    SpinSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// The result
        result: SpinResult,
    },

    /// The spin failed or returned an invalid winner
    #[failure]
    SpinFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },

    /// Fetch the most recent spin
    #[intent]
    LoadLastSpin,

    /// The most recent spin
    #[success]
    LoadLastSpinSucceeded {
        /// Request being settled
        request_id: RequestId,
        /// The result
        result: SpinResult,
    },

    /// Fetching the last spin failed
    #[failure]
    LoadLastSpinFailed {
        /// Request being settled
        request_id: RequestId,
        /// Failure description
        error: String,
    },
}

/// Every action the client store accepts
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum AppAction {
    /// Player roster
    #[nested]
    Player(PlayerAction),

    /// Ticket counts
    #[nested]
    Ticket(TicketAction),

    /// Spins
    #[nested]
    Spin(SpinAction),
}

impl From<PlayerAction> for AppAction {
    fn from(action: PlayerAction) -> Self {
        Self::Player(action)
    }
}

impl From<TicketAction> for AppAction {
    fn from(action: TicketAction) -> Self {
        Self::Ticket(action)
    }
}

impl From<SpinAction> for AppAction {
    fn from(action: SpinAction) -> Self {
        Self::Spin(action)
    }
}

impl PlayerAction {
    /// The operation this action belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ListPlayers | Self::ListPlayersSucceeded { .. } | Self::ListPlayersFailed { .. } => {
                Operation::ListPlayers
            },
            Self::AddPlayer { .. } | Self::AddPlayerSucceeded { .. } | Self::AddPlayerFailed { .. } => {
                Operation::AddPlayer
            },
            Self::UpdatePlayer { .. }
            | Self::UpdatePlayerSucceeded { .. }
            | Self::UpdatePlayerFailed { .. } => Operation::UpdatePlayer,
        }
    }
}

impl TicketAction {
    /// The operation this action belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::GetTickets { .. } | Self::GetTicketsSucceeded { .. } | Self::GetTicketsFailed { .. } => {
                Operation::GetTickets
            },
            Self::IncrementTickets { .. }
            | Self::IncrementTicketsSucceeded { .. }
            | Self::IncrementTicketsFailed { .. } => Operation::IncrementTickets,
            Self::SetTickets { .. } | Self::SetTicketsSucceeded { .. } | Self::SetTicketsFailed { .. } => {
                Operation::SetTickets
            },
        }
    }
}

impl SpinAction {
    /// The operation this action belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Spin { .. } | Self::SpinSucceeded { .. } | Self::SpinFailed { .. } => Operation::Spin,
            Self::LoadLastSpin
            | Self::LoadLastSpinSucceeded { .. }
            | Self::LoadLastSpinFailed { .. } => Operation::LoadLastSpin,
        }
    }
}

impl PlayerAction {
    /// The request an outcome settles; `None` for intents
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::ListPlayers | Self::AddPlayer { .. } | Self::UpdatePlayer { .. } => None,
            Self::ListPlayersSucceeded { request_id, .. }
            | Self::ListPlayersFailed { request_id, .. }
            | Self::AddPlayerSucceeded { request_id, .. }
            | Self::AddPlayerFailed { request_id, .. }
            | Self::UpdatePlayerSucceeded { request_id, .. }
            | Self::UpdatePlayerFailed { request_id, .. } => Some(*request_id),
        }
    }
}

impl TicketAction {
    /// The request an outcome settles; `None` for intents
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::GetTickets { .. } | Self::IncrementTickets { .. } | Self::SetTickets { .. } => None,
            Self::GetTicketsSucceeded { request_id, .. }
            | Self::GetTicketsFailed { request_id, .. }
            | Self::IncrementTicketsSucceeded { request_id, .. }
            | Self::IncrementTicketsFailed { request_id, .. }
            | Self::SetTicketsSucceeded { request_id, .. }
            | Self::SetTicketsFailed { request_id, .. } => Some(*request_id),
        }
    }
}

impl SpinAction {
    /// The request an outcome settles; `None` for intents
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Spin { .. } | Self::LoadLastSpin => None,
            Self::SpinSucceeded { request_id, .. }
            | Self::SpinFailed { request_id, .. }
            | Self::LoadLastSpinSucceeded { request_id, .. }
            | Self::LoadLastSpinFailed { request_id, .. } => Some(*request_id),
        }
    }
}

impl AppAction {
    /// The request an outcome settles; `None` for intents
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::Player(action) => action.request_id(),
            Self::Ticket(action) => action.request_id(),
            Self::Spin(action) => action.request_id(),
        }
    }

    /// The operation this action belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Player(action) => action.operation(),
            Self::Ticket(action) => action.operation(),
            Self::Spin(action) => action.operation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triads_classify() {
        let intent = AppAction::from(TicketAction::SetTickets { tickets: vec![] });
        let success = AppAction::from(TicketAction::SetTicketsSucceeded {
            request_id: RequestId(1),
            tickets: vec![],
        });
        let failure = AppAction::from(TicketAction::SetTicketsFailed {
            request_id: RequestId(1),
            error: "nope".to_string(),
        });

        assert!(intent.is_intent());
        assert!(success.is_success());
        assert!(failure.is_failure());
        assert_eq!(failure.error_message(), Some("nope"));

        assert_eq!(intent.request_id(), None);
        assert_eq!(success.request_id(), Some(RequestId(1)));
        assert_eq!(failure.request_id(), Some(RequestId(1)));

        for action in [intent, success, failure] {
            assert_eq!(action.operation(), Operation::SetTickets);
        }
    }

    #[test]
    fn test_action_type_names_the_variant() {
        let action = AppAction::from(SpinAction::LoadLastSpin);
        assert_eq!(action.action_type(), "LoadLastSpin");
        assert_eq!(action.operation(), Operation::LoadLastSpin);
    }
}
