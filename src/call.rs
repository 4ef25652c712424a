use std::{
    collections::BTreeMap,
    fmt::{self, Formatter},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    error::ArgKind, matcher, Arguments, Error, Function, IntoArguments, Result, Value,
};

/// A call that can be made on a fake: the replacement installed in
/// place of one member.
///
/// You do not need to create these directly, use
/// [`Fake::expects`](crate::Fake::expects),
/// [`Fake::provides`](crate::Fake::provides), etc. `Call` is a cheap
/// handle; clones share the same state.
#[derive(Clone)]
pub struct Call {
    inner: Arc<Inner>,
}

struct Inner {
    owner: String,
    name: Option<String>,
    mandatory: bool,
    state: Mutex<State>,
}

#[derive(Clone, Default)]
struct State {
    replacement: Option<Function>,
    expected_args: Option<Vec<Value>>,
    expected_kwargs: Option<BTreeMap<String, Value>>,
    expected_arg_count: Option<usize>,
    expected_kwarg_count: Option<usize>,
    return_value: Value,
    was_called: bool,
    index: Option<usize>,
}

impl Call {
    fn new(owner: &str, name: Option<&str>, mandatory: bool) -> Self {
        Call {
            inner: Arc::new(Inner {
                owner: owner.to_string(),
                name: name.map(str::to_string),
                mandatory,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// A call that must be made before [`verify`](crate::verify).
    pub fn expected(owner: &str, name: Option<&str>) -> Self {
        Call::new(owner, name, true)
    }

    /// A call that may be made any number of times, or never.
    pub fn provided(owner: &str, name: Option<&str>) -> Self {
        Call::new(owner, name, false)
    }

    /// Name of the fake this call belongs to.
    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    /// Name of the replaced member, `None` for a call on the fake itself.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn is_mandatory(&self) -> bool {
        self.inner.mandatory
    }

    pub fn was_called(&self) -> bool {
        self.inner.state.lock().was_called
    }

    /// Position of this call within a call stack.
    pub fn index(&self) -> Option<usize> {
        self.inner.state.lock().index
    }

    pub fn return_value(&self) -> Value {
        self.inner.state.lock().return_value.clone()
    }

    pub fn expected_args(&self) -> Option<Vec<Value>> {
        self.inner.state.lock().expected_args.clone()
    }

    pub fn expected_kwargs(&self) -> Option<BTreeMap<String, Value>> {
        self.inner.state.lock().expected_kwargs.clone()
    }

    pub fn expected_arg_count(&self) -> Option<usize> {
        self.inner.state.lock().expected_arg_count
    }

    pub fn expected_kwarg_count(&self) -> Option<usize> {
        self.inner.state.lock().expected_kwarg_count
    }

    pub fn set_return_value(&self, value: impl Into<Value>) {
        self.inner.state.lock().return_value = value.into();
    }

    /// Expects exactly these arguments, replacing any earlier
    /// expectation. Named arguments are only checked when at least one
    /// is given.
    pub fn set_expected_args(&self, args: impl IntoArguments) {
        let (positional, named) = args.into_arguments().into_parts();
        let mut state = self.inner.state.lock();
        state.expected_args = Some(positional);
        state.expected_kwargs = (!named.is_empty()).then_some(named);
    }

    pub fn set_expected_arg_count(&self, count: usize) {
        self.inner.state.lock().expected_arg_count = Some(count);
    }

    pub fn set_expected_kwarg_count(&self, count: usize) {
        self.inner.state.lock().expected_kwarg_count = Some(count);
    }

    /// Replaces the call entirely: `replacement` runs instead of any
    /// argument check and its result is returned.
    pub fn set_replacement(&self, replacement: Function) {
        self.inner.state.lock().replacement = Some(replacement);
    }

    fn set_index(&self, index: usize) {
        self.inner.state.lock().index = Some(index);
    }

    /// Makes the call: records it, then checks the arguments against
    /// the expectation and answers with the return value.
    pub fn invoke(&self, args: impl IntoArguments) -> Result<Value> {
        let args = args.into_arguments();
        // clone so the lock is released before any user code runs
        let state = {
            let mut state = self.inner.state.lock();
            state.was_called = true;
            state.clone()
        };

        tracing::trace!(call = %self, args = %args, "fake call");

        if let Some(replacement) = state.replacement {
            return replacement.call(args);
        }

        if let Some(expected) = &state.expected_args {
            if !matcher::args_are_equal(args.positional(), expected) {
                return Err(self.unexpected(&args));
            }
        } else if let Some(expected) = state.expected_arg_count {
            if args.len() != expected {
                return Err(self.arity_mismatch(ArgKind::Positional, args.len(), expected));
            }
        }

        if let Some(expected) = &state.expected_kwargs {
            if !matcher::kwargs_are_equal(args.named(), expected) {
                return Err(Error::UnexpectedKeywordCall {
                    call: self.to_string(),
                    actual: matcher::repr_kwargs(args.named()),
                });
            }
        } else if let Some(expected) = state.expected_kwarg_count {
            let actual = args.named().len();
            if actual != expected {
                return Err(self.arity_mismatch(ArgKind::Keyword, actual, expected));
            }
        }

        Ok(state.return_value)
    }

    /// Fails with [`Error::NotCalled`] when this call is mandatory and
    /// was never made. Provided calls always pass.
    pub fn assert_called(&self) -> Result<()> {
        if self.inner.mandatory && !self.was_called() {
            return Err(Error::NotCalled {
                call: self.to_string(),
            });
        }
        Ok(())
    }

    /// Forgets that the call was made. Expectations and return values
    /// are kept.
    pub fn reset(&self) {
        self.inner.state.lock().was_called = false;
    }

    /// A function that invokes this call, ready to be installed as a
    /// member.
    pub fn trampoline(&self) -> Function {
        let call = self.clone();
        Function::new(move |args| call.invoke(args))
    }

    pub fn ptr_eq(&self, other: &Call) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn unexpected(&self, args: &Arguments) -> Error {
        Error::UnexpectedCall {
            call: self.to_string(),
            actual: args.to_string(),
        }
    }

    fn arity_mismatch(&self, kind: ArgKind, actual: usize, expected: usize) -> Error {
        Error::ArityMismatch {
            call: self.to_string(),
            kind,
            actual,
            expected,
        }
    }
}

pub(crate) fn fake_repr(owner: &str) -> String {
    if owner.is_empty() {
        "fake:unnamed".to_string()
    } else {
        format!("fake:{}", owner)
    }
}

/// `fake:counter.increment(25, table='hits')[1]`
impl fmt::Display for Call {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (expected, index) = {
            let state = self.inner.state.lock();
            let expected = matcher::repr_expected(
                state.expected_args.as_deref(),
                state.expected_kwargs.as_ref(),
            );
            (expected, state.index)
        };

        f.write_str(&fake_repr(&self.inner.owner))?;
        if let Some(name) = &self.inner.name {
            write!(f, ".{}", name)?;
        }
        f.write_str(&expected)?;
        if let Some(index) = index {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Call")
            .field("owner", &self.inner.owner)
            .field("name", &self.inner.name)
            .field("mandatory", &self.inner.mandatory)
            .field("was_called", &state.was_called)
            .field("replaced", &state.replacement.is_some())
            .finish()
    }
}

/// Successive calls to the same member, each answered by the next
/// [`Call`] in line.
///
/// Created by [`CallBuilder::next_call`](crate::CallBuilder::next_call).
#[derive(Clone)]
pub struct CallStack {
    inner: Arc<StackInner>,
}

struct StackInner {
    owner: String,
    expected: bool,
    state: Mutex<StackState>,
}

struct StackState {
    calls: Vec<Call>,
    // position of next call to be made (can be reset)
    pointer: usize,
}

impl CallStack {
    /// Starts a stack with `first` as its first call. The stack is
    /// expected when `first` is.
    pub fn new(first: Call) -> Self {
        let stack = CallStack {
            inner: Arc::new(StackInner {
                owner: first.owner().to_string(),
                expected: first.is_mandatory(),
                state: Mutex::new(StackState {
                    calls: vec![],
                    pointer: 0,
                }),
            }),
        };
        stack.add_call(first);
        stack
    }

    /// Whether the stack was derived from an expected call.
    pub fn is_expected(&self) -> bool {
        self.inner.expected
    }

    pub fn add_call(&self, call: Call) {
        let mut state = self.inner.state.lock();
        call.set_index(state.calls.len());
        state.calls.push(call);
    }

    /// The last *added* call, the one further configuration applies to.
    pub fn last(&self) -> Option<Call> {
        self.inner.state.lock().calls.last().cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.state.lock().calls.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().calls.is_empty()
    }

    /// Rewinds the stack so the next invocation answers with the first call.
    pub fn reset(&self) {
        self.inner.state.lock().pointer = 0;
    }

    pub fn invoke(&self, args: impl IntoArguments) -> Result<Value> {
        let current = {
            let mut state = self.inner.state.lock();
            match state.calls.get(state.pointer).cloned() {
                Some(call) => {
                    state.pointer += 1;
                    Ok(call)
                }
                None => Err(Error::CallsExhausted {
                    fake: fake_repr(&self.inner.owner),
                    limit: state.calls.len(),
                }),
            }
        }?;

        current.invoke(args)
    }

    pub fn trampoline(&self) -> Function {
        let stack = self.clone();
        Function::new(move |args| stack.invoke(args))
    }
}

impl fmt::Debug for CallStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CallStack")
            .field("owner", &self.inner.owner)
            .field("calls", &state.calls.len())
            .field("pointer", &state.pointer)
            .finish()
    }
}
