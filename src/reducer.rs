use std::rc::Rc;

use derive_ex::derive_ex;


/// Pure transition from the current state and an action to the next state.
///
/// A reducer must not perform side effects and must be deterministic.
/// It receives shared references only, so neither the state nor the action can be modified.
///
/// For actions it does not handle, a reducer returns `state.clone()`.
/// The store compares the result with [`Rc::ptr_eq`], so returning the same `Rc` means "no change"
/// and no subscriber is notified.
pub trait Reducer<S, A>: 'static {
    fn reduce(&self, state: &Rc<S>, action: &A) -> Rc<S>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&Rc<S>, &A) -> Rc<S> + 'static,
{
    fn reduce(&self, state: &Rc<S>, action: &A) -> Rc<S> {
        self(state, action)
    }
}

/// Reducer composed from independent slice reducers.
///
/// Each slice is an `Rc<T>` field of `S` reduced by its own `Reducer<T, A>`.
/// Every slice reducer sees the slice value from the incoming state, never the result of another slice.
///
/// If no slice changes, the incoming `Rc<S>` is returned as is.
/// Otherwise a shallow clone of `S` is made once, changed slices are replaced and unchanged slices are shared.
/// Nothing is built until every slice reducer has returned, so a panicking slice leaves no partial state.
///
/// ```
/// use std::rc::Rc;
/// use unidux::{Action, CombineReducers, Reducer};
///
/// #[derive(Action)]
/// enum AppAction {
///     Increment,
///     Rename(String),
/// }
///
/// #[derive(Clone, Default)]
/// struct App {
///     count: Rc<i32>,
///     name: Rc<String>,
/// }
///
/// fn count(state: &Rc<i32>, action: &AppAction) -> Rc<i32> {
///     match action {
///         AppAction::Increment => Rc::new(**state + 1),
///         _ => state.clone(),
///     }
/// }
/// fn name(state: &Rc<String>, action: &AppAction) -> Rc<String> {
///     match action {
///         AppAction::Rename(name) => Rc::new(name.clone()),
///         _ => state.clone(),
///     }
/// }
///
/// let reducer = CombineReducers::new()
///     .slice(|s: &App| &s.count, |s: &mut App| &mut s.count, count)
///     .slice(|s: &App| &s.name, |s: &mut App| &mut s.name, name);
///
/// let s0 = Rc::new(App::default());
/// let s1 = reducer.reduce(&s0, &AppAction::Increment);
/// assert_eq!(*s1.count, 1);
/// assert!(Rc::ptr_eq(&s0.name, &s1.name));
/// ```
#[derive_ex(Default, bound())]
#[default(Self::new())]
pub struct CombineReducers<S: 'static, A: 'static> {
    slices: Vec<Box<dyn SliceReducer<S, A>>>,
}

impl<S: 'static, A: 'static> CombineReducers<S, A> {
    pub fn new() -> Self {
        Self { slices: Vec::new() }
    }
    pub fn len(&self) -> usize {
        self.slices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<S: Clone + 'static, A: 'static> CombineReducers<S, A> {
    /// Adds a slice located by `get` and `get_mut` and reduced by `reducer`.
    pub fn slice<T: 'static>(
        mut self,
        get: fn(&S) -> &Rc<T>,
        get_mut: fn(&mut S) -> &mut Rc<T>,
        reducer: impl Reducer<T, A>,
    ) -> Self {
        self.slices.push(Box::new(Slice {
            get,
            get_mut,
            reducer,
        }));
        self
    }
}

impl<S: Clone + 'static, A: 'static> Reducer<S, A> for CombineReducers<S, A> {
    fn reduce(&self, state: &Rc<S>, action: &A) -> Rc<S> {
        let mut next = None;
        for slice in &self.slices {
            slice.reduce_into(state, &mut next, action);
        }
        match next {
            Some(next) => Rc::new(next),
            None => state.clone(),
        }
    }
}

trait SliceReducer<S, A> {
    fn reduce_into(&self, state: &S, next: &mut Option<S>, action: &A);
}

struct Slice<S, T, R> {
    get: fn(&S) -> &Rc<T>,
    get_mut: fn(&mut S) -> &mut Rc<T>,
    reducer: R,
}

impl<S, T, A, R> SliceReducer<S, A> for Slice<S, T, R>
where
    S: Clone,
    R: Reducer<T, A>,
{
    fn reduce_into(&self, state: &S, next: &mut Option<S>, action: &A) {
        let current = (self.get)(state);
        let reduced = self.reducer.reduce(current, action);
        if !Rc::ptr_eq(current, &reduced) {
            let next = next.get_or_insert_with(|| state.clone());
            *(self.get_mut)(next) = reduced;
        }
    }
}
