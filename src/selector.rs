use std::{
    cell::{Cell, RefCell},
    convert::Infallible,
    marker::PhantomData,
    rc::Rc,
};

use derive_ex::derive_ex;


/// Projection from state to a value, with the equality used to detect changes in that value.
pub trait Input<S: ?Sized>: 'static {
    type Value: 'static;
    fn select(&self, state: &S) -> Self::Value;
    fn same(&self, a: &Self::Value, b: &Self::Value) -> bool;
}

/// Input that returns an `Rc` and compares by pointer.
pub struct ByRef<S: ?Sized, V: ?Sized, F> {
    f: F,
    _phantom: PhantomData<fn(&S) -> Rc<V>>,
}

/// Creates an input that returns an `Rc` and compares by pointer.
///
/// This is the usual input for state slices, because an unchanged slice keeps its `Rc`.
pub fn by_ref<S, V, F>(f: F) -> ByRef<S, V, F>
where
    S: ?Sized + 'static,
    V: ?Sized + 'static,
    F: Fn(&S) -> Rc<V> + 'static,
{
    ByRef {
        f,
        _phantom: PhantomData,
    }
}

impl<S, V, F> Input<S> for ByRef<S, V, F>
where
    S: ?Sized + 'static,
    V: ?Sized + 'static,
    F: Fn(&S) -> Rc<V> + 'static,
{
    type Value = Rc<V>;
    fn select(&self, state: &S) -> Self::Value {
        (self.f)(state)
    }
    fn same(&self, a: &Self::Value, b: &Self::Value) -> bool {
        Rc::ptr_eq(a, b)
    }
}

/// Input that compares by [`PartialEq`].
pub struct ByValue<S: ?Sized, V, F> {
    f: F,
    _phantom: PhantomData<fn(&S) -> V>,
}

/// Creates an input that compares by [`PartialEq`].
pub fn by_value<S, V, F>(f: F) -> ByValue<S, V, F>
where
    S: ?Sized + 'static,
    V: PartialEq + 'static,
    F: Fn(&S) -> V + 'static,
{
    ByValue {
        f,
        _phantom: PhantomData,
    }
}

impl<S, V, F> Input<S> for ByValue<S, V, F>
where
    S: ?Sized + 'static,
    V: PartialEq + 'static,
    F: Fn(&S) -> V + 'static,
{
    type Value = V;
    fn select(&self, state: &S) -> Self::Value {
        (self.f)(state)
    }
    fn same(&self, a: &Self::Value, b: &Self::Value) -> bool {
        a == b
    }
}

/// Input with a custom equality.
pub struct ByEq<S: ?Sized, V, F> {
    f: F,
    eq: fn(&V, &V) -> bool,
    _phantom: PhantomData<fn(&S) -> V>,
}

/// Creates an input that compares with `eq`.
pub fn by_eq<S, V, F>(f: F, eq: fn(&V, &V) -> bool) -> ByEq<S, V, F>
where
    S: ?Sized + 'static,
    V: 'static,
    F: Fn(&S) -> V + 'static,
{
    ByEq {
        f,
        eq,
        _phantom: PhantomData,
    }
}

impl<S, V, F> Input<S> for ByEq<S, V, F>
where
    S: ?Sized + 'static,
    V: 'static,
    F: Fn(&S) -> V + 'static,
{
    type Value = V;
    fn select(&self, state: &S) -> Self::Value {
        (self.f)(state)
    }
    fn same(&self, a: &Self::Value, b: &Self::Value) -> bool {
        (self.eq)(a, b)
    }
}

/// A tuple of [`Input`]s.
pub trait Inputs<S: ?Sized>: 'static {
    type Values: 'static;
    fn select(&self, state: &S) -> Self::Values;
    fn same(&self, a: &Self::Values, b: &Self::Values) -> bool;
}

macro_rules! impl_inputs {
    ($($t:ident $i:tt),*) => {
        impl<S: ?Sized, $($t: Input<S>),*> Inputs<S> for ($($t,)*) {
            type Values = ($($t::Value,)*);
            fn select(&self, state: &S) -> Self::Values {
                ($(self.$i.select(state),)*)
            }
            fn same(&self, a: &Self::Values, b: &Self::Values) -> bool {
                true $(&& self.$i.same(&a.$i, &b.$i))*
            }
        }
    };
}

impl_inputs!(I0 0);
impl_inputs!(I0 0, I1 1);
impl_inputs!(I0 0, I1 1, I2 2);
impl_inputs!(I0 0, I1 1, I2 2, I3 3);

/// Memoized projection of state.
///
/// A selector evaluates its inputs on every call, and calls the combiner only when some input
/// differs from the previous call. The cache holds exactly one generation: the most recent inputs and their result.
///
/// A selector is itself an [`Input`] compared by pointer, so selectors compose.
/// When an upstream selector recomputes, its result is a new `Rc`, which invalidates the downstream selectors
/// depending on it and no others.
///
/// `Selector` is a handle: clones share the same cache.
///
/// ```
/// use std::rc::Rc;
/// use unidux::{by_ref, Selector};
///
/// struct Cart {
///     items: Rc<Vec<u32>>,
/// }
///
/// let total = Selector::new((by_ref(|s: &Cart| s.items.clone()),), |(items,)| {
///     items.iter().sum::<u32>()
/// });
///
/// let cart = Cart { items: Rc::new(vec![1, 2, 3]) };
/// assert_eq!(*total.compute(&cart), 6);
/// assert_eq!(*total.compute(&cart), 6);
/// assert_eq!(total.recomputations(), 1);
/// ```
#[derive_ex(Clone, bound())]
pub struct Selector<S: ?Sized + 'static, T: 'static, E: 'static = Infallible>(
    Rc<dyn SelectorNode<S, T, E>>,
);

impl<S: ?Sized + 'static, T: 'static> Selector<S, T> {
    /// Create a new `Selector` from a tuple of inputs and a combiner.
    pub fn new<I>(inputs: I, combiner: impl Fn(&I::Values) -> T + 'static) -> Self
    where
        I: Inputs<S>,
    {
        Self::try_new(inputs, move |values: &I::Values| Ok(combiner(values)))
    }

    /// Returns the memoized result for `state`.
    pub fn compute(&self, state: &S) -> Rc<T> {
        match self.0.try_compute(state) {
            Ok(value) => value,
            Err(e) => match e {},
        }
    }
}

impl<S: ?Sized + 'static, T: 'static, E: 'static> Selector<S, T, E> {
    /// Create a new `Selector` whose combiner may fail.
    pub fn try_new<I>(inputs: I, combiner: impl Fn(&I::Values) -> Result<T, E> + 'static) -> Self
    where
        I: Inputs<S>,
    {
        Self(Rc::new(MemoNode {
            inputs,
            combiner,
            memo: RefCell::new(None),
            recomputations: Cell::new(0),
            _phantom: PhantomData,
        }))
    }

    /// Returns the memoized result for `state`, or the combiner's error.
    ///
    /// A failed computation is not cached, so the next call with the same inputs runs the combiner again.
    pub fn try_compute(&self, state: &S) -> Result<Rc<T>, E> {
        self.0.try_compute(state)
    }

    /// Number of times the combiner has been called.
    pub fn recomputations(&self) -> usize {
        self.0.recomputations()
    }

    /// Clears the cache so that the next call recomputes.
    pub fn reset(&self) {
        self.0.reset()
    }
}

impl<S: ?Sized + 'static, T: 'static> Input<S> for Selector<S, T> {
    type Value = Rc<T>;
    fn select(&self, state: &S) -> Self::Value {
        self.compute(state)
    }
    fn same(&self, a: &Self::Value, b: &Self::Value) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl<S: ?Sized + 'static, T: 'static, E: 'static> std::fmt::Debug for Selector<S, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("recomputations", &self.recomputations())
            .finish_non_exhaustive()
    }
}

trait SelectorNode<S: ?Sized, T, E> {
    fn try_compute(&self, state: &S) -> Result<Rc<T>, E>;
    fn recomputations(&self) -> usize;
    fn reset(&self);
}

struct Memo<V, T> {
    inputs: V,
    output: Rc<T>,
}

struct MemoNode<S: ?Sized, T, E, I: Inputs<S>, F> {
    inputs: I,
    combiner: F,
    memo: RefCell<Option<Memo<I::Values, T>>>,
    recomputations: Cell<usize>,
    _phantom: PhantomData<fn(&S) -> Result<T, E>>,
}

impl<S, T, E, I, F> SelectorNode<S, T, E> for MemoNode<S, T, E, I, F>
where
    S: ?Sized,
    I: Inputs<S>,
    F: Fn(&I::Values) -> Result<T, E>,
{
    fn try_compute(&self, state: &S) -> Result<Rc<T>, E> {
        let inputs = self.inputs.select(state);
        if let Some(memo) = &*self.memo.borrow() {
            if self.inputs.same(&memo.inputs, &inputs) {
                return Ok(memo.output.clone());
            }
        }
        self.recomputations.set(self.recomputations.get() + 1);
        let output = Rc::new((self.combiner)(&inputs)?);
        *self.memo.borrow_mut() = Some(Memo {
            inputs,
            output: output.clone(),
        });
        Ok(output)
    }
    fn recomputations(&self) -> usize {
        self.recomputations.get()
    }
    fn reset(&self) {
        self.memo.borrow_mut().take();
    }
}
