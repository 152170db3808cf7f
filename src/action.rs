
/// Derives [`Action`] for an enum. See the trait for the generated items.
pub use unidux_macros::Action;

/// A description of an intended state change.
///
/// Actions are closed enums: each variant is one tag, and the variant's fields are its payload.
/// Reducers match on the enum, so every tag is handled or explicitly ignored at build time.
///
/// Usually implemented with `#[derive(Action)]`.
pub trait Action: 'static {
    /// Every tag this action type can take, in declaration order.
    const NAMES: &'static [&'static str];

    /// The tag of this action.
    fn name(&self) -> &'static str;

    /// Position of this action's tag in [`NAMES`](Self::NAMES).
    fn index(&self) -> usize {
        let name = self.name();
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .unwrap_or(Self::NAMES.len())
    }
}

/// Returns `true` if `name` is one of the tags of `A`.
pub fn is_action_name<A: Action>(name: &str) -> bool {
    A::NAMES.contains(&name)
}
