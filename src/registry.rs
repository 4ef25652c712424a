use std::{
    fmt::{self, Formatter},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{Call, CallStack, Result};

thread_local! {
    static CURRENT: Registry = Registry::new();
}

/// A registry of expected calls.
///
/// Each thread owns a default registry, returned by
/// [`Registry::current`], which is what [`Fake`](crate::Fake)s
/// register with unless told otherwise. `Registry` is a cheap handle;
/// clones share the same expectations.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<Expectations>>,
}

#[derive(Default)]
struct Expectations {
    expected_calls: Vec<Call>,
    call_stacks: Vec<CallStack>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// The calling thread's default registry.
    pub fn current() -> Self {
        CURRENT.with(Registry::clone)
    }

    /// Adds a call that must be made before [`verify`](Registry::verify).
    ///
    /// No attempt is made to deduplicate: registering the same call
    /// twice checks it twice.
    pub fn expect_call(&self, call: Call) {
        tracing::debug!(call = %call, "expecting call");
        self.inner.lock().expected_calls.push(call);
    }

    /// Adds a call stack to be rewound by [`clear_calls`](Registry::clear_calls).
    pub fn register_call_stack(&self, stack: CallStack) {
        self.inner.lock().call_stacks.push(stack);
    }

    /// The expected calls, in the order they were registered.
    pub fn expected_calls(&self) -> Vec<Call> {
        self.inner.lock().expected_calls.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expected_calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expected_calls.is_empty()
    }

    /// Forgets every call made so far and rewinds every call stack.
    /// The expectations themselves are kept.
    pub fn clear_actual_calls(&self) {
        let (calls, stacks) = {
            let expectations = self.inner.lock();
            (
                expectations.expected_calls.clone(),
                expectations.call_stacks.clone(),
            )
        };

        calls.iter().for_each(Call::reset);
        stacks.iter().for_each(CallStack::reset);
        tracing::debug!(calls = calls.len(), stacks = stacks.len(), "cleared calls");
    }

    /// Alias of [`clear_actual_calls`](Registry::clear_actual_calls).
    pub fn clear_calls(&self) {
        self.clear_actual_calls()
    }

    /// Drops every expectation. Fakes keep working, they are just no
    /// longer verified.
    pub fn clear_expectations(&self) {
        let mut expectations = self.inner.lock();
        expectations.expected_calls.clear();
        expectations.call_stacks.clear();
        tracing::debug!("cleared expectations");
    }

    pub fn clear_all(&self) {
        self.clear_actual_calls();
        self.clear_expectations();
    }

    /// Ensures every expected call was made.
    ///
    /// Stops at the first call that was not made and returns its
    /// [`Error::NotCalled`](crate::Error::NotCalled). Calls are cleared
    /// either way so the next test starts afresh; expectations are
    /// kept.
    pub fn verify(&self) -> Result<()> {
        let calls = self.expected_calls();
        let verified = calls.iter().try_for_each(Call::assert_called);
        self.clear_actual_calls();

        match &verified {
            Ok(()) => tracing::debug!(calls = calls.len(), "verified expected calls"),
            Err(e) => tracing::warn!(error = %e, "verification failed"),
        }
        verified
    }

    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let expectations = self.inner.lock();
        f.debug_struct("Registry")
            .field("expected_calls", &expectations.expected_calls)
            .field("call_stacks", &expectations.call_stacks)
            .finish()
    }
}
