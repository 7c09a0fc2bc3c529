//! In-memory transport for tests
//!
//! [`InMemoryTransport`] serves all three resources from in-process maps,
//! behaving like the remote services: sequential player ids starting at 0,
//! a rejected update for an unknown id, zero counts removing the entry, and
//! a spin that increments every participant before drawing and resets the
//! winner afterwards. The draw is deterministic: the participant holding
//! the most tickets wins, ties going to the earliest submitted.
//!
//! Tests can script the next call of an operation: delay its response,
//! fail it at the transport level, or reject it with an application error.
//! Scripted delays apply after the server-side change, so a delayed
//! response may reach the client after a newer one.

use crate::error::TransportError;
use crate::transport::{
    AddPlayerRequest, Envelope, IncrementTicketsRequest, PlayerEnvelope, PlayerTransport,
    PlayersEnvelope, SetTicketsRequest, SpinEnvelope, SpinRequest, SpinTransport, TicketIdsQuery,
    TicketTransport, TicketsEnvelope, TransportFuture, UpdatePlayerRequest,
};
use crate::types::{Operation, Player, PlayerId, SpinResult, Ticket, parse_ids};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A scripted failure for the next call of an operation
#[derive(Debug, Clone)]
enum Injected {
    Transport(TransportError),
    Application(String),
}

#[derive(Debug, Default)]
struct Server {
    players: BTreeMap<PlayerId, String>,
    next_player_id: u64,
    tickets: BTreeMap<PlayerId, u32>,
    last_spin: Option<SpinResult>,
    forced_winner: Option<PlayerId>,
    delays: HashMap<Operation, VecDeque<Duration>>,
    failures: HashMap<Operation, VecDeque<Injected>>,
    calls: Vec<Operation>,
}

impl Server {
    fn knows(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id) || self.tickets.contains_key(&id)
    }

    fn count(&self, id: PlayerId) -> u32 {
        self.tickets.get(&id).copied().unwrap_or(0)
    }

    fn set_count(&mut self, id: PlayerId, tickets: u32) {
        if tickets == 0 {
            self.tickets.remove(&id);
        } else {
            self.tickets.insert(id, tickets);
        }
    }

    fn increment(&mut self, ids: &[PlayerId]) -> Vec<Ticket> {
        ids.iter()
            .map(|&id| {
                let tickets = self.count(id).saturating_add(1);
                self.tickets.insert(id, tickets);
                Ticket::new(id, tickets)
            })
            .collect()
    }

    fn list_players(&self) -> PlayersEnvelope {
        PlayersEnvelope::ok(
            self.players
                .iter()
                .map(|(&id, name)| Player::new(id, name.clone()))
                .collect(),
        )
    }

    fn add_player(&mut self, name: String) -> PlayerEnvelope {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.insert(id, name.clone());
        PlayerEnvelope::ok(Player::new(id, name))
    }

    fn update_player(&mut self, player: Player) -> PlayerEnvelope {
        match self.players.get_mut(&player.id) {
            Some(name) => {
                name.clone_from(&player.name);
                PlayerEnvelope::ok(player)
            },
            None => PlayerEnvelope::rejected("player does not exist"),
        }
    }

    fn get_tickets(&self, query: &TicketIdsQuery) -> TicketsEnvelope {
        match parse_ids(&query.ids) {
            Ok(ids) => TicketsEnvelope::ok(
                ids.into_iter()
                    .filter(|&id| self.knows(id))
                    .map(|id| Ticket::new(id, self.count(id)))
                    .collect(),
            ),
            Err(_) => TicketsEnvelope::rejected("error parsing ids, should be ints"),
        }
    }

    fn increment_tickets(&mut self, request: &IncrementTicketsRequest) -> TicketsEnvelope {
        match parse_ids(&request.ids) {
            Ok(ids) => TicketsEnvelope::ok(self.increment(&ids)),
            Err(_) => TicketsEnvelope::rejected("error parsing ids, should be ints"),
        }
    }

    fn set_tickets(&mut self, request: SetTicketsRequest) -> TicketsEnvelope {
        for ticket in &request.tickets {
            self.set_count(ticket.id, ticket.tickets);
        }
        TicketsEnvelope::ok(request.tickets)
    }

    fn spin(&mut self, request: SpinRequest) -> SpinEnvelope {
        let counts = self.increment(&request.participant_ids);
        if counts.iter().map(|t| u64::from(t.tickets)).sum::<u64>() == 0 {
            return SpinEnvelope::rejected("no participants or none of the participants have tickets");
        }

        let drawn = if request.unweighted {
            counts.first().map(|t| t.id)
        } else {
            counts
                .iter()
                .rev()
                .max_by_key(|t| t.tickets)
                .map(|t| t.id)
        };
        let Some(winner_id) = self.forced_winner.or(drawn) else {
            return SpinEnvelope::rejected("no participants or none of the participants have tickets");
        };

        self.set_count(winner_id, 0);
        let result = SpinResult {
            participant_ids: request.participant_ids,
            winner_id,
        };
        self.last_spin = Some(result.clone());
        SpinEnvelope::ok(result)
    }

    fn last_spin(&self) -> SpinEnvelope {
        match &self.last_spin {
            Some(result) => SpinEnvelope::ok(result.clone()),
            None => SpinEnvelope::rejected("no spin yet to return"),
        }
    }
}

/// Transport double serving players, tickets and spins from memory
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    server: Mutex<Server>,
}

impl InMemoryTransport {
    /// An empty server
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed players; later ids continue after the highest seeded id
    #[must_use]
    pub fn with_players(self, players: impl IntoIterator<Item = Player>) -> Self {
        {
            let mut server = self.lock();
            for player in players {
                server.next_player_id = server.next_player_id.max(player.id.get() + 1);
                server.players.insert(player.id, player.name);
            }
        }
        self
    }

    /// Seed ticket counts
    #[must_use]
    pub fn with_tickets(self, tickets: impl IntoIterator<Item = Ticket>) -> Self {
        {
            let mut server = self.lock();
            for ticket in tickets {
                server.set_count(ticket.id, ticket.tickets);
            }
        }
        self
    }

    /// Hold back the response of the next `operation` call by `delay`
    ///
    /// Delays queue up: each call consumes the oldest one.
    pub fn delay_next(&self, operation: Operation, delay: Duration) {
        self.lock()
            .delays
            .entry(operation)
            .or_default()
            .push_back(delay);
    }

    /// Fail the next `operation` call at the transport level
    pub fn fail_next(&self, operation: Operation, error: TransportError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(Injected::Transport(error));
    }

    /// Answer the next `operation` call with an application error
    pub fn reject_next(&self, operation: Operation, message: impl Into<String>) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(Injected::Application(message.into()));
    }

    /// Make every following spin report `winner`, in the pool or not
    pub fn force_winner(&self, winner: PlayerId) {
        self.lock().forced_winner = Some(winner);
    }

    /// Operations served so far, in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    /// The server-side count for `id`
    #[must_use]
    pub fn server_tickets(&self, id: PlayerId) -> u32 {
        self.lock().count(id)
    }

    /// The server-side name for `id`
    #[must_use]
    pub fn server_player(&self, id: PlayerId) -> Option<String> {
        self.lock().players.get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `handler` now and deliver its envelope after any scripted delay
    fn serve<E, F>(&self, operation: Operation, handler: F) -> TransportFuture<'_, E>
    where
        E: Envelope + Send + 'static,
        F: FnOnce(&mut Server) -> E,
    {
        let (delay, response) = {
            let mut server = self.lock();
            server.calls.push(operation);
            let delay = server
                .delays
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            let injected = server
                .failures
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);

            let response = match injected {
                Some(Injected::Transport(error)) => Err(error),
                Some(Injected::Application(message)) => Ok(E::rejected(message)),
                None => Ok(handler(&mut server)),
            };
            (delay, response)
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }
}

impl PlayerTransport for InMemoryTransport {
    fn list_players(&self) -> TransportFuture<'_, PlayersEnvelope> {
        self.serve(Operation::ListPlayers, |server| server.list_players())
    }

    fn add_player(&self, request: AddPlayerRequest) -> TransportFuture<'_, PlayerEnvelope> {
        self.serve(Operation::AddPlayer, |server| server.add_player(request.name))
    }

    fn update_player(&self, request: UpdatePlayerRequest) -> TransportFuture<'_, PlayerEnvelope> {
        self.serve(Operation::UpdatePlayer, |server| server.update_player(request.player))
    }
}

impl TicketTransport for InMemoryTransport {
    fn get_tickets(&self, query: TicketIdsQuery) -> TransportFuture<'_, TicketsEnvelope> {
        self.serve(Operation::GetTickets, |server| server.get_tickets(&query))
    }

    fn increment_tickets(
        &self,
        request: IncrementTicketsRequest,
    ) -> TransportFuture<'_, TicketsEnvelope> {
        self.serve(Operation::IncrementTickets, |server| {
            server.increment_tickets(&request)
        })
    }

    fn set_tickets(&self, request: SetTicketsRequest) -> TransportFuture<'_, TicketsEnvelope> {
        self.serve(Operation::SetTickets, |server| server.set_tickets(request))
    }
}

impl SpinTransport for InMemoryTransport {
    fn spin(&self, request: SpinRequest) -> TransportFuture<'_, SpinEnvelope> {
        self.serve(Operation::Spin, |server| server.spin(request))
    }

    fn last_spin(&self) -> TransportFuture<'_, SpinEnvelope> {
        self.serve(Operation::LoadLastSpin, |server| server.last_spin())
    }
}
