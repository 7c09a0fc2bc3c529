//! Domain types shared by the transport, gateways and state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned player identifier
///
/// Also the key of a player's ticket count: tickets and players correlate by
/// id equality only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Create a player id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Parse a comma-separated id list such as `1,2,3`
///
/// Empty segments are skipped, so `"1,,2,"` yields two ids.
///
/// # Errors
///
/// Returns the parse error of the first segment that is not an unsigned integer.
pub fn parse_ids(csv: &str) -> Result<Vec<PlayerId>, std::num::ParseIntError> {
    csv.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(PlayerId::from_str)
        .collect()
}

/// Render ids the way batched requests carry them: `1,2,3`
#[must_use]
pub fn ids_csv(ids: &[PlayerId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A player as the server knows it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Server-assigned id, immutable once created
    pub id: PlayerId,
    /// Display name
    pub name: String,
}

impl Player {
    /// Create a player record
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Ticket count of one player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// The player the count belongs to
    pub id: PlayerId,
    /// Number of tickets held
    pub tickets: u32,
}

impl Ticket {
    /// Create a ticket count
    #[must_use]
    pub const fn new(id: PlayerId, tickets: u32) -> Self {
        Self { id, tickets }
    }
}

/// Outcome of one spin of the wheel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    /// Eligible players, in the order they were submitted
    pub participant_ids: Vec<PlayerId>,
    /// The drawn player
    pub winner_id: PlayerId,
}

impl SpinResult {
    /// A result is valid when the winner was one of the participants
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.participant_ids.contains(&self.winner_id)
    }
}

/// How the remote resolver weighs participants
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpinMode {
    /// Chance proportional to each participant's tickets
    #[default]
    Weighted,
    /// Every participant has the same chance
    Unweighted,
}

impl SpinMode {
    /// Whether the request asks for an unweighted draw
    #[must_use]
    pub const fn is_unweighted(self) -> bool {
        matches!(self, Self::Unweighted)
    }
}

/// Identifies one in-flight request from intent to outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The remote operations a request can be waiting on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Fetch the full roster
    ListPlayers,
    /// Create a player
    AddPlayer,
    /// Rename a player
    UpdatePlayer,
    /// Fetch ticket counts for an id set
    GetTickets,
    /// Add one ticket to each id in a set
    IncrementTickets,
    /// Overwrite ticket counts
    SetTickets,
    /// Resolve a spin
    Spin,
    /// Fetch the latest spin
    LoadLastSpin,
}

impl Operation {
    /// Stable snake-case name, used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListPlayers => "list_players",
            Self::AddPlayer => "add_player",
            Self::UpdatePlayer => "update_player",
            Self::GetTickets => "get_tickets",
            Self::IncrementTickets => "increment_tickets",
            Self::SetTickets => "set_tickets",
            Self::Spin => "spin",
            Self::LoadLastSpin => "load_last_spin",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_skips_blank_segments() {
        let ids = parse_ids(" 1, 2,,3 ,").unwrap();
        assert_eq!(ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
        assert!(parse_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ids_rejects_non_integers() {
        assert!(parse_ids("1,two").is_err());
        assert!(parse_ids("-1").is_err());
    }

    #[test]
    fn test_ids_csv() {
        assert_eq!(ids_csv(&[PlayerId(3), PlayerId(1)]), "3,1");
        assert_eq!(ids_csv(&[]), "");
    }

    #[test]
    fn test_spin_result_wire_shape() {
        let result: SpinResult =
            serde_json::from_str(r#"{"participantIds":[1,2,3],"winnerId":2}"#).unwrap();
        assert_eq!(result.participant_ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
        assert_eq!(result.winner_id, PlayerId(2));
        assert!(result.is_valid());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["participantIds"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["winnerId"], 2);
    }

    #[test]
    fn test_winner_outside_pool_is_invalid() {
        let result = SpinResult {
            participant_ids: vec![PlayerId(1), PlayerId(2), PlayerId(3)],
            winner_id: PlayerId(9),
        };
        assert!(!result.is_valid());
    }

    #[test]
    fn test_negative_ticket_count_is_rejected_on_decode() {
        assert!(serde_json::from_str::<Ticket>(r#"{"id":1,"tickets":-2}"#).is_err());
    }
}
