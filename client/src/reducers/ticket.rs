use super::immediately;
use crate::actions::{AppAction, TicketAction};
use crate::environment::ClientEnvironment;
use crate::gateway::{validate_ids, validate_tickets};
use crate::state::AppState;
use crate::types::Operation;
use wheelspin_core::{Effect, Reducer, SmallVec, gateway_effect, smallvec};

/// Merges ticket outcomes into the ticket store
///
/// Every success overwrites only the ids it names. Overlapping requests are
/// not fenced: whichever success is reduced last wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketReducer;

impl TicketReducer {
    /// Create a new ticket reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TicketReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = ClientEnvironment;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &ClientEnvironment,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        let AppAction::Ticket(action) = action else {
            return smallvec![Effect::None];
        };

        match action {
            TicketAction::GetTickets { ids } => {
                let request_id = state.requests.begin(Operation::GetTickets);
                if let Err(error) = validate_ids(&ids) {
                    return smallvec![immediately(AppAction::Ticket(TicketAction::GetTicketsFailed {
                        request_id,
                        error: error.to_string(),
                    }))];
                }

                smallvec![gateway_effect! {
                    gateway: env.tickets,
                    call: |tickets| tickets.get_tickets(ids),
                    on_success: |tickets| Some(AppAction::Ticket(TicketAction::GetTicketsSucceeded {
                        request_id,
                        tickets,
                    })),
                    on_error: |error| Some(AppAction::Ticket(TicketAction::GetTicketsFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            TicketAction::IncrementTickets { ids } => {
                let request_id = state.requests.begin(Operation::IncrementTickets);
                if let Err(error) = validate_ids(&ids) {
                    return smallvec![immediately(AppAction::Ticket(
                        TicketAction::IncrementTicketsFailed {
                            request_id,
                            error: error.to_string(),
                        }
                    ))];
                }

                smallvec![gateway_effect! {
                    gateway: env.tickets,
                    call: |tickets| tickets.increment_tickets(ids),
                    on_success: |tickets| Some(AppAction::Ticket(TicketAction::IncrementTicketsSucceeded {
                        request_id,
                        tickets,
                    })),
                    on_error: |error| Some(AppAction::Ticket(TicketAction::IncrementTicketsFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            TicketAction::SetTickets { tickets } => {
                let request_id = state.requests.begin(Operation::SetTickets);
                if let Err(error) = validate_tickets(&tickets) {
                    return smallvec![immediately(AppAction::Ticket(TicketAction::SetTicketsFailed {
                        request_id,
                        error: error.to_string(),
                    }))];
                }

                smallvec![gateway_effect! {
                    gateway: env.tickets,
                    call: |gateway| gateway.set_tickets(tickets),
                    on_success: |tickets| Some(AppAction::Ticket(TicketAction::SetTicketsSucceeded {
                        request_id,
                        tickets,
                    })),
                    on_error: |error| Some(AppAction::Ticket(TicketAction::SetTicketsFailed {
                        request_id,
                        error: error.to_string(),
                    }))
                }]
            },

            TicketAction::GetTicketsSucceeded { request_id, tickets }
            | TicketAction::IncrementTicketsSucceeded { request_id, tickets }
            | TicketAction::SetTicketsSucceeded { request_id, tickets } => {
                state.tickets.merge(tickets);
                state.settle(request_id);
                smallvec![Effect::None]
            },

            TicketAction::GetTicketsFailed { request_id, error }
            | TicketAction::IncrementTicketsFailed { request_id, error }
            | TicketAction::SetTicketsFailed { request_id, error } => {
                tracing::warn!(%request_id, %error, "ticket request failed");
                state.fail(request_id, error);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryTransport;
    use crate::state::TicketStore;
    use crate::types::{PlayerId, RequestId, Ticket};
    use proptest::prelude::*;
    use std::sync::Arc;
    use wheelspin_testing::helpers::resolve_effects;
    use wheelspin_testing::{ReducerTest, assertions};

    fn env() -> ClientEnvironment {
        ClientEnvironment::from_transport(Arc::new(InMemoryTransport::new()))
    }

    fn loaded(request_id: u64, tickets: &[(u64, u32)]) -> AppAction {
        AppAction::Ticket(TicketAction::GetTicketsSucceeded {
            request_id: RequestId(request_id),
            tickets: tickets
                .iter()
                .map(|&(id, count)| Ticket::new(PlayerId(id), count))
                .collect(),
        })
    }

    #[test]
    fn test_get_success_merges_named_ids() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(AppState {
                tickets: TicketStore::from([(1, 5), (2, 3)]),
                ..AppState::default()
            })
            .when_action(loaded(1, &[(1, 7)]))
            .then_state(|state| {
                assert_eq!(state.tickets, TicketStore::from([(1, 7), (2, 3)]));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_set_success_overwrites_including_zero() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(AppState {
                tickets: TicketStore::from([(1, 5), (2, 3)]),
                ..AppState::default()
            })
            .when_action(AppAction::Ticket(TicketAction::SetTicketsSucceeded {
                request_id: RequestId(1),
                tickets: vec![Ticket::new(PlayerId(2), 0), Ticket::new(PlayerId(4), 9)],
            }))
            .then_state(|state| {
                assert_eq!(state.tickets, TicketStore::from([(1, 5), (2, 0), (4, 9)]));
            })
            .run();
    }

    #[test]
    fn test_out_of_order_last_applied_wins() {
        let older = loaded(1, &[(1, 5)]);
        let newer = loaded(2, &[(1, 9)]);

        // newer resolves first, older lands last
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions(vec![newer.clone()])
            .when_action(older.clone())
            .then_state(|state| assert_eq!(state.tickets.get(PlayerId(1)), Some(5)))
            .run();

        // dispatch order
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions(vec![older])
            .when_action(newer)
            .then_state(|state| assert_eq!(state.tickets.get(PlayerId(1)), Some(9)))
            .run();
    }

    #[test]
    fn test_failure_keeps_counts() {
        ReducerTest::new(TicketReducer::new())
            .with_env(env())
            .given_state(AppState {
                tickets: TicketStore::from([(1, 5)]),
                ..AppState::default()
            })
            .when_action(AppAction::Ticket(TicketAction::IncrementTicketsFailed {
                request_id: RequestId(3),
                error: "transport failure: request to POST /tickets/increment timed out".to_string(),
            }))
            .then_state(|state| {
                assert_eq!(state.tickets, TicketStore::from([(1, 5)]));
                assert!(state.last_error.as_deref().is_some_and(|e| e.contains("timed out")));
            })
            .run();
    }

    #[tokio::test]
    async fn test_empty_id_set_fails_immediately() {
        let transport = Arc::new(InMemoryTransport::new());
        let env = ClientEnvironment::from_transport(Arc::clone(&transport));
        let mut state = AppState::default();

        let effects = TicketReducer::new().reduce(
            &mut state,
            AppAction::Ticket(TicketAction::IncrementTickets { ids: vec![] }),
            &env,
        );
        let produced = resolve_effects(effects.into_vec()).await;

        assert_eq!(produced.len(), 1);
        assert!(produced[0].is_failure());
        assert!(state.requests.is_pending(Operation::IncrementTickets));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_increment_intent_resolves_to_new_counts() {
        let transport = Arc::new(InMemoryTransport::new().with_tickets([Ticket::new(PlayerId(1), 2)]));
        let env = ClientEnvironment::from_transport(transport);
        let mut state = AppState::default();

        let effects = TicketReducer::new().reduce(
            &mut state,
            AppAction::Ticket(TicketAction::IncrementTickets {
                ids: vec![PlayerId(1)],
            }),
            &env,
        );
        let produced = resolve_effects(effects.into_vec()).await;

        assert_eq!(
            produced,
            vec![AppAction::Ticket(TicketAction::IncrementTicketsSucceeded {
                request_id: RequestId(1),
                tickets: vec![Ticket::new(PlayerId(1), 3)],
            })]
        );
    }

    proptest! {
        #[test]
        fn prop_merge_changes_only_named_entries(
            before in prop::collection::btree_map(0u64..30, 0u32..100, 0..20),
            response in prop::collection::btree_map(0u64..30, 0u32..100, 0..10),
        ) {
            let env = env();
            let mut state = AppState::default();
            state.tickets.merge(before.iter().map(|(&id, &n)| Ticket::new(PlayerId(id), n)).collect());
            let prior = state.tickets.clone();

            let action = AppAction::Ticket(TicketAction::GetTicketsSucceeded {
                request_id: RequestId(1),
                tickets: response.iter().map(|(&id, &n)| Ticket::new(PlayerId(id), n)).collect(),
            });
            let _ = TicketReducer::new().reduce(&mut state, action, &env);

            for ticket in prior.iter() {
                let expected = response.get(&ticket.id.get()).copied().unwrap_or(ticket.tickets);
                prop_assert_eq!(state.tickets.get(ticket.id), Some(expected));
            }
            for (&id, &count) in &response {
                prop_assert_eq!(state.tickets.get(PlayerId(id)), Some(count));
            }
            let mut keys: std::collections::BTreeSet<u64> = before.keys().copied().collect();
            keys.extend(response.keys().copied());
            prop_assert_eq!(state.tickets.len(), keys.len());
        }
    }
}
