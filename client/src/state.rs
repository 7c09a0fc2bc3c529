//! Normalized client state
//!
//! Players and tickets are id-keyed maps that correlate by id equality only;
//! nothing holds a reference from a ticket entry to a player entry.

use crate::types::{Operation, Player, PlayerId, RequestId, SpinResult, Ticket};
use std::collections::BTreeMap;

/// Player id to name, for every player the server has acknowledged
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerStore {
    names: BTreeMap<PlayerId, String>,
}

impl PlayerStore {
    /// Create-or-overwrite one entry
    pub fn upsert(&mut self, player: Player) {
        self.names.insert(player.id, player.name);
    }

    /// Replace every entry with `players`
    pub fn replace_all(&mut self, players: Vec<Player>) {
        self.names = players.into_iter().map(|p| (p.id, p.name)).collect();
    }

    /// Name of `id`, if known
    #[must_use]
    pub fn name(&self, id: PlayerId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Known ids, ascending
    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.names.keys().copied()
    }

    /// Entries, ascending by id
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &str)> {
        self.names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    /// Number of known players
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no player is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<const N: usize> From<[(u64, &str); N]> for PlayerStore {
    fn from(entries: [(u64, &str); N]) -> Self {
        Self {
            names: entries
                .into_iter()
                .map(|(id, name)| (PlayerId(id), name.to_string()))
                .collect(),
        }
    }
}

/// Player id to last-known ticket count
///
/// Partial: ids never queried are simply missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketStore {
    counts: BTreeMap<PlayerId, u32>,
}

impl TicketStore {
    /// Overwrite the entries named in `tickets`, leaving the rest untouched
    pub fn merge(&mut self, tickets: Vec<Ticket>) {
        self.counts
            .extend(tickets.into_iter().map(|t| (t.id, t.tickets)));
    }

    /// Count for `id`, if known
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<u32> {
        self.counts.get(&id).copied()
    }

    /// Entries, ascending by id
    pub fn iter(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.counts.iter().map(|(&id, &tickets)| Ticket::new(id, tickets))
    }

    /// Number of known counts
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no count is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<const N: usize> From<[(u64, u32); N]> for TicketStore {
    fn from(entries: [(u64, u32); N]) -> Self {
        Self {
            counts: entries
                .into_iter()
                .map(|(id, tickets)| (PlayerId(id), tickets))
                .collect(),
        }
    }
}

/// The latest validated spin; no history is kept
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpinState {
    latest: Option<SpinResult>,
}

impl SpinState {
    /// Replace the latest result
    pub fn record(&mut self, result: SpinResult) {
        self.latest = Some(result);
    }

    /// The latest result, if any
    #[must_use]
    pub const fn latest(&self) -> Option<&SpinResult> {
        self.latest.as_ref()
    }
}

/// Requests between intent and outcome
///
/// Bookkeeping for loading indicators. Ids are not used to fence stale
/// outcomes: a late success is still applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Requests {
    next_request_id: u64,
    in_flight: BTreeMap<RequestId, Operation>,
}

impl Requests {
    /// Allocate the next id and mark `operation` pending under it
    pub fn begin(&mut self, operation: Operation) -> RequestId {
        self.next_request_id += 1;
        let id = RequestId(self.next_request_id);
        self.in_flight.insert(id, operation);
        id
    }

    /// The id `begin` allocated most recently
    #[must_use]
    pub const fn latest(&self) -> Option<RequestId> {
        match self.next_request_id {
            0 => None,
            id => Some(RequestId(id)),
        }
    }

    /// Remove `id`, returning the operation it was waiting on
    pub fn settle(&mut self, id: RequestId) -> Option<Operation> {
        self.in_flight.remove(&id)
    }

    /// True while any request for `operation` is in flight
    #[must_use]
    pub fn is_pending(&self, operation: Operation) -> bool {
        self.in_flight.values().any(|&op| op == operation)
    }

    /// Number of requests in flight
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// One row of the roster view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry<'a> {
    /// Player id
    pub id: PlayerId,
    /// Player name
    pub name: &'a str,
    /// Ticket count, when known
    pub tickets: Option<u32>,
}

/// Everything the client knows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Acknowledged players
    pub players: PlayerStore,
    /// Last-known ticket counts
    pub tickets: TicketStore,
    /// Latest spin
    pub spin: SpinState,
    /// Requests in flight
    pub requests: Requests,
    /// Text of the most recent failure, cleared by the next success
    pub last_error: Option<String>,
}

impl AppState {
    /// Close `request_id` after a success
    pub fn settle(&mut self, request_id: RequestId) {
        self.requests.settle(request_id);
        self.last_error = None;
    }

    /// Close `request_id` after a failure and surface `error`
    pub fn fail(&mut self, request_id: RequestId, error: String) {
        self.requests.settle(request_id);
        self.last_error = Some(error);
    }

    /// Players joined with their ticket counts, ascending by id
    #[must_use]
    pub fn roster(&self) -> Vec<RosterEntry<'_>> {
        self.players
            .iter()
            .map(|(id, name)| RosterEntry {
                id,
                name,
                tickets: self.tickets.get(id),
            })
            .collect()
    }

    /// Name of the latest winner, if the winner is a known player
    #[must_use]
    pub fn winner_name(&self) -> Option<&str> {
        self.spin
            .latest()
            .and_then(|result| self.players.name(result.winner_id))
    }

    /// True while any request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.requests.pending_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_track_pending_operations() {
        let mut requests = Requests::default();
        assert_eq!(requests.latest(), None);

        let first = requests.begin(Operation::GetTickets);
        let second = requests.begin(Operation::GetTickets);
        let third = requests.begin(Operation::Spin);

        assert_ne!(first, second);
        assert_eq!(requests.latest(), Some(third));
        assert_eq!(requests.pending_count(), 3);
        assert!(requests.is_pending(Operation::GetTickets));

        assert_eq!(requests.settle(first), Some(Operation::GetTickets));
        assert!(requests.is_pending(Operation::GetTickets));
        requests.settle(second);
        assert!(!requests.is_pending(Operation::GetTickets));
        assert!(requests.is_pending(Operation::Spin));

        requests.settle(third);
        assert_eq!(requests.settle(third), None);
        assert_eq!(requests.pending_count(), 0);
    }

    #[test]
    fn test_roster_joins_by_id() {
        let state = AppState {
            players: PlayerStore::from([(1, "Ann"), (2, "Bo")]),
            tickets: TicketStore::from([(2, 3), (9, 1)]),
            ..AppState::default()
        };

        assert_eq!(
            state.roster(),
            vec![
                RosterEntry {
                    id: PlayerId(1),
                    name: "Ann",
                    tickets: None,
                },
                RosterEntry {
                    id: PlayerId(2),
                    name: "Bo",
                    tickets: Some(3),
                },
            ]
        );
    }

    #[test]
    fn test_winner_name() {
        let mut state = AppState {
            players: PlayerStore::from([(1, "Ann"), (2, "Bo")]),
            ..AppState::default()
        };
        assert_eq!(state.winner_name(), None);

        state.spin.record(SpinResult {
            participant_ids: vec![PlayerId(1), PlayerId(2)],
            winner_id: PlayerId(2),
        });
        assert_eq!(state.winner_name(), Some("Bo"));
    }

    #[test]
    fn test_settle_and_fail_drive_last_error() {
        let mut state = AppState::default();
        let a = state.requests.begin(Operation::AddPlayer);
        let b = state.requests.begin(Operation::AddPlayer);

        state.fail(a, "boom".to_string());
        assert_eq!(state.last_error.as_deref(), Some("boom"));
        assert!(state.is_loading());

        state.settle(b);
        assert_eq!(state.last_error, None);
        assert!(!state.is_loading());
    }
}
