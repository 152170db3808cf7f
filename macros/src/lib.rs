use proc_macro::TokenStream;
use syn_utils::into_macro_output;

#[macro_use]
mod syn_utils;

mod action_impl;

/// Implements [`Action`](unidux::Action) for an enum.
///
/// Each variant becomes one action tag. The tag is the variant name unless
/// overridden with `#[action(rename = "...")]`.
///
/// # Examples
///
/// ```ignore
/// #[derive(Action, Debug)]
/// enum CounterAction {
///     Increment,
///     #[action(rename = "ADD")]
///     Add(i32),
/// }
///
/// assert_eq!(CounterAction::NAMES, &["Increment", "ADD"]);
/// assert_eq!(CounterAction::Add(3).name(), "ADD");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    into_macro_output(action_impl::derive_action(input.into()))
}
