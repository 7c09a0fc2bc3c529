//! Driving one intent to its outcome

use crate::actions::AppAction;
use crate::error::DispatchError;
use crate::state::AppState;
use crate::ClientStore;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

/// Send `intent`, wait for it and every follow-up it triggers, and return
/// the outcome that settles it
///
/// The outcome is matched on the request id the reducer allocated for this
/// intent, so overlapping requests for the same operation each get their
/// own result. Follow-ups are awaited too: a spin returns once the ticket
/// refresh it triggers has also been reduced.
///
/// # Errors
///
/// - `DispatchError::Store` if the store is shutting down or the effects
///   did not finish within `timeout`
/// - `DispatchError::Unsettled` if no outcome for this request was observed
pub async fn dispatch(
    store: &ClientStore,
    intent: AppAction,
    timeout: Duration,
) -> Result<AppAction, DispatchError> {
    let operation = intent.operation();
    let is_intent = intent.is_intent();
    let mut observed = store.subscribe_actions();

    tracing::debug!(%operation, action = intent.action_type(), "dispatching intent");
    let (mut handle, request_id) = store
        .send_cascading_with(intent, |state: &AppState| state.requests.latest())
        .await?;
    handle.wait_with_timeout(timeout).await?;

    let Some(request_id) = request_id.filter(|_| is_intent) else {
        return Err(DispatchError::Unsettled(operation));
    };

    loop {
        match observed.try_recv() {
            Ok(action) if action.is_outcome() && action.request_id() == Some(request_id) => {
                return Ok(action);
            },
            Ok(_) => {},
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "dispatch observer lagged");
            },
            Err(TryRecvError::Empty | TryRecvError::Closed) => {
                tracing::warn!(%operation, %request_id, "no outcome observed");
                return Err(DispatchError::Unsettled(operation));
            },
        }
    }
}
