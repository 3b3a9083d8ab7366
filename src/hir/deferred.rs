//! Memoized thunks for values whose inputs arrive after they are requested.
//!
//! A constructor's return type is the owning class's self type, and computing
//! that self type may need the constructor. [`DeferredValue`] lets the
//! constructor be built first and the self type read later, on first use.

use std::fmt;

use parking_lot::Mutex;
use smol_str::SmolStr;

use super::error::ResolveError;

type Thunk<T, Cx> = Box<dyn FnOnce(&Cx) -> Result<T, ResolveError> + Send>;

enum State<T, Cx: ?Sized> {
    Pending(Thunk<T, Cx>),
    Computing,
    Ready(T),
    Failed(ResolveError),
}

/// A value computed at most once, on first [`get`](DeferredValue::get).
///
/// The computation receives a context (`Cx`) at read time instead of
/// capturing it, so the thunk can be installed before the context it reads
/// from is fully built. Reading the value from inside its own computation is
/// reported as [`ResolveError::DeferredCycle`]; a failed computation is
/// remembered and its error returned on every later read.
pub struct DeferredValue<T, Cx: ?Sized> {
    label: SmolStr,
    state: Mutex<State<T, Cx>>,
}

impl<T: Clone, Cx: ?Sized> DeferredValue<T, Cx> {
    pub fn new(
        label: impl Into<SmolStr>,
        compute: impl FnOnce(&Cx) -> Result<T, ResolveError> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(State::Pending(Box::new(compute))),
        }
    }

    /// Force the value.
    pub fn get(&self, cx: &Cx) -> Result<T, ResolveError> {
        let thunk = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Computing) {
                State::Pending(thunk) => thunk,
                State::Computing => {
                    tracing::debug!(value = %self.label, "deferred value re-entered");
                    return Err(ResolveError::DeferredCycle(self.label.clone()));
                }
                State::Ready(value) => {
                    *state = State::Ready(value.clone());
                    return Ok(value);
                }
                State::Failed(err) => {
                    *state = State::Failed(err.clone());
                    return Err(err);
                }
            }
        };

        // The lock is released here: the thunk may read other deferred
        // values, or this one, which must see `Computing`.
        let result = thunk(cx);

        *self.state.lock() = match &result {
            Ok(value) => State::Ready(value.clone()),
            Err(err) => State::Failed(err.clone()),
        };
        result
    }

    /// The value if it has been computed. Never runs the thunk.
    pub fn peek(&self) -> Option<T> {
        match &*self.state.lock() {
            State::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(&*self.state.lock(), State::Ready(_) | State::Failed(_))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T, Cx: ?Sized> fmt::Debug for DeferredValue<T, Cx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.lock() {
            State::Pending(_) => "pending",
            State::Computing => "computing",
            State::Ready(_) => "ready",
            State::Failed(_) => "failed",
        };
        f.debug_struct("DeferredValue")
            .field("label", &self.label)
            .field("state", &state)
            .finish()
    }
}
