//! Derive macros for wheelspin action vocabularies
//!
//! Every remote operation is described by a triad of actions: an *intent*
//! carrying the request parameters, a *success* carrying the confirmed
//! result, and a *failure* carrying an error description. `#[derive(Action)]`
//! turns the variant markers into classification helpers used by the
//! runtime callers (waiting for an outcome) and by logging.
//!
//! # Example
//!
//! ```ignore
//! use wheelspin_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TicketAction {
//!     #[intent]
//!     GetTickets { request_id: RequestId, ids: Vec<PlayerId> },
//!
//!     #[success]
//!     TicketsLoaded { request_id: RequestId, tickets: Vec<Ticket> },
//!
//!     #[failure]
//!     TicketsFailed { request_id: RequestId, error: String },
//! }
//!
//! #[derive(Action, Clone, Debug)]
//! enum AppAction {
//!     #[nested]
//!     Ticket(TicketAction),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Variant, parse_macro_input};

/// The role a variant plays in its operation's triad
#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Intent,
    Success,
    Failure,
    Nested,
    Unmarked,
}

/// Derive macro for action enums
///
/// Generates:
/// - `is_intent()`, `is_success()`, `is_failure()`
/// - `is_outcome()` - success or failure, i.e. the action that settles an intent
/// - `action_type()` - the variant name, for logs and metrics labels
/// - `error_message()` - the `error` field of failure variants
///
/// # Attributes
///
/// - `#[intent]` - a requested operation before its outcome is known
/// - `#[success]` - confirmed result of an intent
/// - `#[failure]` - error outcome of an intent; must have a named `error` field
/// - `#[nested]` - a single-field tuple variant wrapping another action enum
///   that also derives `Action`; every helper delegates to the inner value
///
/// Unmarked variants answer `false` to every predicate.
///
/// # Errors
///
/// Produces a compile error if:
/// - Applied to a non-enum type
/// - A variant carries more than one marker
/// - A `#[failure]` variant has no named `error` field
/// - A `#[nested]` variant is not a single-field tuple variant
#[proc_macro_derive(Action, attributes(intent, success, failure, nested))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_action(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand_action(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums",
        ));
    };

    let mut is_intent_arms = Vec::new();
    let mut is_success_arms = Vec::new();
    let mut is_failure_arms = Vec::new();
    let mut action_type_arms = Vec::new();
    let mut error_message_arms = Vec::new();

    for variant in &data_enum.variants {
        let role = role_of(variant)?;
        let ident = &variant.ident;
        let pattern = wildcard_pattern(variant);

        if role == Role::Nested {
            is_intent_arms.push(quote! { Self::#ident(inner) => inner.is_intent(), });
            is_success_arms.push(quote! { Self::#ident(inner) => inner.is_success(), });
            is_failure_arms.push(quote! { Self::#ident(inner) => inner.is_failure(), });
            action_type_arms.push(quote! { Self::#ident(inner) => inner.action_type(), });
            error_message_arms.push(quote! { Self::#ident(inner) => inner.error_message(), });
            continue;
        }

        let type_name = ident.to_string();
        action_type_arms.push(quote! { #pattern => #type_name, });

        match role {
            Role::Intent => is_intent_arms.push(quote! { #pattern => true, }),
            Role::Success => is_success_arms.push(quote! { #pattern => true, }),
            Role::Failure => {
                is_failure_arms.push(quote! { #pattern => true, });
                error_message_arms
                    .push(quote! { Self::#ident { error, .. } => Some(error.as_str()), });
            },
            Role::Nested | Role::Unmarked => {},
        }
    }

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Returns true if this action requests an operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub fn is_intent(&self) -> bool {
                match self {
                    #(#is_intent_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action confirms an operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub fn is_success(&self) -> bool {
                match self {
                    #(#is_success_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action reports a failed operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub fn is_failure(&self) -> bool {
                match self {
                    #(#is_failure_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action settles an intent (success or failure)
            #[must_use]
            pub fn is_outcome(&self) -> bool {
                self.is_success() || self.is_failure()
            }

            /// The variant name of this action
            #[must_use]
            pub fn action_type(&self) -> &'static str {
                match self {
                    #(#action_type_arms)*
                }
            }

            /// The error description carried by a failure action
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_wildcard_for_single_variants)]
            pub fn error_message(&self) -> Option<&str> {
                match self {
                    #(#error_message_arms)*
                    _ => None,
                }
            }
        }
    })
}

fn role_of(variant: &Variant) -> syn::Result<Role> {
    let marked: Vec<Role> = [
        ("intent", Role::Intent),
        ("success", Role::Success),
        ("failure", Role::Failure),
        ("nested", Role::Nested),
    ]
    .into_iter()
    .filter(|(attr, _)| has_attribute(&variant.attrs, attr))
    .map(|(_, role)| role)
    .collect();

    let role = match marked.as_slice() {
        [] => Role::Unmarked,
        [role] => *role,
        _ => {
            return Err(syn::Error::new_spanned(
                variant,
                "Variant can carry only one of #[intent], #[success], #[failure], #[nested]",
            ));
        },
    };

    match role {
        Role::Failure if !has_named_field(variant, "error") => Err(syn::Error::new_spanned(
            variant,
            "#[failure] variants must have a named `error` field",
        )),
        Role::Nested if !matches!(&variant.fields, Fields::Unnamed(f) if f.unnamed.len() == 1) => {
            Err(syn::Error::new_spanned(
                variant,
                "#[nested] variants must wrap exactly one action: `Variant(InnerAction)`",
            ))
        },
        _ => Ok(role),
    }
}

/// Pattern matching any value of `variant`
fn wildcard_pattern(variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

fn has_named_field(variant: &Variant, name: &str) -> bool {
    match &variant.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .any(|field| field.ident.as_ref().is_some_and(|ident| ident == name)),
        Fields::Unnamed(_) | Fields::Unit => false,
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
