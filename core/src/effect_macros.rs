//! Effect construction macros
//!
//! Every intent has the same shape: call a gateway, then map the outcome to
//! exactly one success or failure action.

/// Create an `Effect::Future` that calls a gateway and maps its result
///
/// The gateway handle is cloned (`Arc::clone`) before being moved into the
/// future, so the reducer keeps no borrow of its environment. Exactly one of
/// `on_success` / `on_error` is evaluated.
///
/// # Example
///
/// ```rust,ignore
/// use wheelspin_core::gateway_effect;
///
/// gateway_effect! {
///     gateway: env.players,
///     call: |players| players.list_players(),
///     on_success: |list| Some(PlayerAction::ListPlayersSucceeded { request_id, players: list }),
///     on_error: |error| Some(PlayerAction::ListPlayersFailed { request_id, error: error.to_string() })
/// }
/// ```
#[macro_export]
macro_rules! gateway_effect {
    (
        gateway: $gateway:expr,
        call: |$handle:ident| $call:expr,
        on_success: |$success_param:ident| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {{
        let $handle = ::std::sync::Arc::clone(&$gateway);
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    }};
}

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use wheelspin_core::async_effect;
///
/// async_effect! {
///     Some(AppAction::Ticket(TicketAction::GetTickets { ids }))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
