//! Store-level synchronization scenarios over the in-memory transport

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;
use wheelspin_client::dispatch::dispatch;
use wheelspin_client::mocks::InMemoryTransport;
use wheelspin_client::state::{PlayerStore, TicketStore};
use wheelspin_client::transport::{SetTicketsRequest, TicketTransport};
use wheelspin_client::{
    AppAction, AppState, ClientEnvironment, ClientStore, Operation, Player, PlayerAction, PlayerId,
    RequestId, Ticket, TicketAction, TransportError, client_store,
};

const TIMEOUT: Duration = Duration::from_secs(2);

fn store_over(transport: &Arc<InMemoryTransport>) -> ClientStore {
    client_store(ClientEnvironment::from_transport(Arc::clone(transport)))
}

/// Yield until the server has seen `count` calls, pinning arrival order
async fn until_calls(transport: &InMemoryTransport, count: usize) {
    while transport.calls().len() < count {
        tokio::task::yield_now().await;
    }
}

fn set(id: u64, tickets: u32) -> AppAction {
    AppAction::Ticket(TicketAction::SetTickets {
        tickets: vec![Ticket::new(PlayerId(id), tickets)],
    })
}

#[tokio::test]
async fn test_list_discards_entries_missing_from_response() {
    let transport = Arc::new(InMemoryTransport::new().with_players([Player::new(PlayerId(2), "Bo")]));
    let store = store_over(&transport);

    // an add confirmed earlier, since superseded on the server
    store
        .send(AppAction::Player(PlayerAction::AddPlayerSucceeded {
            request_id: RequestId(100),
            player: Player::new(PlayerId(1), "Ann"),
        }))
        .await
        .unwrap();
    assert_eq!(store.state(|s| s.players.clone()).await, PlayerStore::from([(1, "Ann")]));

    let outcome = dispatch(&store, AppAction::Player(PlayerAction::ListPlayers), TIMEOUT)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(store.state(|s| s.players.clone()).await, PlayerStore::from([(2, "Bo")]));
}

#[tokio::test]
async fn test_partial_fetch_merges() {
    let transport = Arc::new(
        InMemoryTransport::new()
            .with_players([Player::new(PlayerId(1), "Ann"), Player::new(PlayerId(2), "Bo")])
            .with_tickets([Ticket::new(PlayerId(1), 7), Ticket::new(PlayerId(2), 3)]),
    );
    let store = store_over(&transport);

    dispatch(
        &store,
        AppAction::Ticket(TicketAction::GetTickets {
            ids: vec![PlayerId(2)],
        }),
        TIMEOUT,
    )
    .await
    .unwrap();
    // the server moves on behind the client's back
    transport
        .set_tickets(SetTicketsRequest {
            tickets: vec![Ticket::new(PlayerId(2), 4)],
        })
        .await
        .unwrap();
    dispatch(
        &store,
        AppAction::Ticket(TicketAction::GetTickets {
            ids: vec![PlayerId(1)],
        }),
        TIMEOUT,
    )
    .await
    .unwrap();

    // entry 2 keeps the value of its own fetch
    assert_eq!(store.state(|s| s.tickets.clone()).await, TicketStore::from([(1, 7), (2, 3)]));
}

#[tokio::test]
async fn test_out_of_order_success_overwrites_newer_value() {
    let transport = Arc::new(InMemoryTransport::new());
    transport.delay_next(Operation::SetTickets, Duration::from_millis(100));
    let store = store_over(&transport);

    let mut older = store.send_cascading(set(1, 5)).await.unwrap();
    until_calls(&transport, 1).await;
    let mut newer = store.send_cascading(set(1, 9)).await.unwrap();
    newer.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(store.state(|s| s.tickets.get(PlayerId(1))).await, Some(9));

    older.wait_with_timeout(TIMEOUT).await.unwrap();

    // the older response landed last and wins, although the server holds 9
    assert_eq!(store.state(|s| s.tickets.get(PlayerId(1))).await, Some(5));
    assert_eq!(transport.server_tickets(PlayerId(1)), 9);
}

#[tokio::test]
async fn test_in_order_resolution_keeps_newer_value() {
    let transport = Arc::new(InMemoryTransport::new());
    transport.delay_next(Operation::SetTickets, Duration::ZERO);
    transport.delay_next(Operation::SetTickets, Duration::from_millis(100));
    let store = store_over(&transport);

    let mut older = store.send_cascading(set(1, 5)).await.unwrap();
    until_calls(&transport, 1).await;
    let mut newer = store.send_cascading(set(1, 9)).await.unwrap();
    older.wait_with_timeout(TIMEOUT).await.unwrap();
    newer.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(store.state(|s| s.tickets.get(PlayerId(1))).await, Some(9));
}

#[tokio::test]
async fn test_pending_is_visible_until_outcome() {
    let transport = Arc::new(InMemoryTransport::new().with_players([Player::new(PlayerId(1), "Ann")]));
    transport.delay_next(Operation::GetTickets, Duration::from_millis(100));
    let store = store_over(&transport);

    let mut handle = store
        .send(AppAction::Ticket(TicketAction::GetTickets {
            ids: vec![PlayerId(1)],
        }))
        .await
        .unwrap();

    assert!(store.state(|s| s.requests.is_pending(Operation::GetTickets)).await);
    assert!(store.state(AppState::is_loading).await);

    handle.wait_with_timeout(TIMEOUT).await.unwrap();

    assert!(!store.state(|s| s.requests.is_pending(Operation::GetTickets)).await);
    assert_eq!(store.state(|s| s.tickets.get(PlayerId(1))).await, Some(0));
}

#[tokio::test]
async fn test_transport_failure_surfaces_generic_description() {
    let transport = Arc::new(InMemoryTransport::new().with_tickets([Ticket::new(PlayerId(1), 2)]));
    transport.fail_next(
        Operation::IncrementTickets,
        TransportError::RequestFailed {
            route: "POST /tickets/increment",
            message: "connection refused".to_string(),
        },
    );
    let store = store_over(&transport);

    let outcome = dispatch(
        &store,
        AppAction::Ticket(TicketAction::IncrementTickets {
            ids: vec![PlayerId(1)],
        }),
        TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.error_message(),
        Some("transport failure: request to POST /tickets/increment failed: connection refused")
    );
    assert!(store.state(|s| s.tickets.is_empty()).await);
    assert_eq!(transport.server_tickets(PlayerId(1)), 2);
}

#[tokio::test]
async fn test_application_failure_then_success_clears_error() {
    let transport = Arc::new(InMemoryTransport::new());
    transport.reject_next(Operation::AddPlayer, "name taken");
    let store = store_over(&transport);
    let add = || {
        AppAction::Player(PlayerAction::AddPlayer {
            name: "Ann".to_string(),
        })
    };

    let failed = dispatch(&store, add(), TIMEOUT).await.unwrap();
    assert_eq!(failed.error_message(), Some("name taken"));
    assert_eq!(store.state(|s| s.last_error.clone()).await.as_deref(), Some("name taken"));

    let added = dispatch(&store, add(), TIMEOUT).await.unwrap();
    assert!(added.is_success());
    assert_eq!(store.state(|s| s.last_error.clone()).await, None);
    assert_eq!(store.state(|s| s.players.len()).await, 1);
}

#[tokio::test]
async fn test_duplicate_in_flight_requests_each_settle() {
    let transport = Arc::new(InMemoryTransport::new().with_players([Player::new(PlayerId(1), "Ann")]));
    transport.delay_next(Operation::ListPlayers, Duration::from_millis(50));
    transport.delay_next(Operation::ListPlayers, Duration::from_millis(50));
    let store = store_over(&transport);

    let mut first = store
        .send_cascading(AppAction::Player(PlayerAction::ListPlayers))
        .await
        .unwrap();
    let mut second = store
        .send_cascading(AppAction::Player(PlayerAction::ListPlayers))
        .await
        .unwrap();
    assert_eq!(store.state(|s| s.requests.pending_count()).await, 2);

    first.wait_with_timeout(TIMEOUT).await.unwrap();
    second.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(store.state(|s| s.requests.pending_count()).await, 0);
    assert_eq!(store.state(|s| s.players.clone()).await, PlayerStore::from([(1, "Ann")]));
    assert_eq!(transport.calls(), vec![Operation::ListPlayers, Operation::ListPlayers]);
}
