use std::{
    collections::BTreeMap,
    fmt::{self, Formatter},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    call::fake_repr, namespace, Call, CallStack, Error, Function, IntoArguments, Object,
    Registry, Result, Value,
};

/// Name of the member that simulates construction.
///
/// When declared, calling the fake's object invokes this call and
/// answers with the object itself, the way `Type::new(..)` answers
/// with a new instance.
pub const CONSTRUCTOR: &str = "new";

/// Options for creating a [`Fake`].
#[derive(Clone, Debug, Default)]
pub struct FakeConfig {
    /// Object to install calls on. When set, the name is only a label.
    pub object: Option<Object>,
    /// Container the name is resolved under instead of
    /// [`namespace::globals`].
    pub root: Option<Object>,
    /// When `true`, any member may be called on the object. Each
    /// undeclared member is a stub that does nothing. Implies
    /// `callable`.
    pub allows_any_call: bool,
    /// When `true`, the object itself can be called. Use this if you are
    /// replacing a single function.
    pub callable: bool,
}

/// Builds a [`Fake`] out of a name and a [`FakeConfig`].
///
/// ```
/// use fudge::{Fake, Object, Value};
///
/// let root = Object::new();
/// let fake = Fake::builder("auth")
///     .root(&root)
///     .callable(true)
///     .build()
///     .unwrap()
///     .returns(true);
///
/// let auth = root.get("auth").unwrap();
/// assert_eq!(auth.call(()).unwrap(), Value::Bool(true));
/// # let _ = fake;
/// ```
#[derive(Debug)]
pub struct FakeBuilder {
    name: String,
    config: FakeConfig,
    registry: Option<Registry>,
}

impl FakeBuilder {
    pub fn object(mut self, object: &Object) -> Self {
        self.config.object = Some(object.clone());
        self
    }

    pub fn root(mut self, root: &Object) -> Self {
        self.config.root = Some(root.clone());
        self
    }

    pub fn allows_any_call(mut self, allows_any_call: bool) -> Self {
        self.config.allows_any_call = allows_any_call;
        self
    }

    pub fn callable(mut self, callable: bool) -> Self {
        self.config.callable = callable;
        self
    }

    pub fn config(mut self, config: FakeConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers expected calls with `registry` instead of the thread's
    /// current one.
    pub fn registry(mut self, registry: &Registry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Resolves the object to fake and creates the [`Fake`].
    ///
    /// Fails with [`Error::InvalidName`] when no object was given and
    /// the name cannot be resolved.
    pub fn build(self) -> Result<Fake> {
        let FakeBuilder {
            name,
            mut config,
            registry,
        } = self;

        let object = match config.object.take() {
            Some(object) => object,
            None if name.is_empty() => {
                return Err(Error::invalid_name(
                    &name,
                    "can only create a Fake from a name or an object",
                ))
            }
            None => {
                let root = config.root.take().unwrap_or_else(namespace::globals);
                namespace::resolve(&root, &name)?
            }
        };

        let registry = registry.unwrap_or_else(Registry::current);
        Ok(Fake::over(name, object, &config, registry))
    }
}

enum Declared {
    Call(Call),
    Stack(CallStack),
}

impl Declared {
    // the call further configuration applies to
    fn current(&self) -> Option<Call> {
        match self {
            Declared::Call(call) => Some(call.clone()),
            Declared::Stack(stack) => stack.last(),
        }
    }
}

/// A fake object that replaces a real one while testing.
///
/// Declaring a call with [`expects`](Fake::expects) or
/// [`provides`](Fake::provides) installs it on the faked
/// [`Object`] immediately and returns a [`CallBuilder`] to configure
/// it. `Fake` is a cheap handle: clones configure the same fake.
///
/// ```
/// use fudge::{namespace, Fake};
///
/// let auth = Fake::new("auth").unwrap();
/// auth.expects("login").with_args(("joe_username", "joes_password"));
///
/// let auth = namespace::globals().get("auth").unwrap();
/// auth.invoke("login", ("joe_username", "joes_password")).unwrap();
/// fudge::verify().unwrap();
/// # fudge::clear_expectations();
/// ```
#[derive(Clone)]
pub struct Fake {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    object: Object,
    registry: Registry,
    allows_any_call: bool,
    // `None` is the call on the object itself
    declared: Mutex<BTreeMap<Option<String>, Declared>>,
}

impl Fake {
    /// Fakes the object found at the dotted path `name` in
    /// [`namespace::globals`], creating it if needed.
    pub fn new(name: &str) -> Result<Self> {
        Fake::builder(name).build()
    }

    pub fn builder(name: &str) -> FakeBuilder {
        FakeBuilder {
            name: name.to_string(),
            config: FakeConfig::default(),
            registry: None,
        }
    }

    /// Fakes `object` directly; `name` is only used in messages.
    pub fn wrap(name: &str, object: &Object) -> Self {
        Fake::over(
            name.to_string(),
            object.clone(),
            &FakeConfig::default(),
            Registry::current(),
        )
    }

    fn over(name: String, object: Object, config: &FakeConfig, registry: Registry) -> Self {
        object.set_label(fake_repr(&name));

        let stub = Call::provided(&name, None);
        let callable = config.callable || config.allows_any_call;
        if callable {
            object.set_call_hook(Some(stub.trampoline()));
        }

        if config.allows_any_call {
            let owner = name.clone();
            object.on_missing_member(move |object, member| {
                let function = Call::provided(&owner, Some(member)).trampoline();
                object.set(member, function.clone());
                Some(Value::Function(function))
            });
        }

        let mut declared = BTreeMap::new();
        declared.insert(None, Declared::Call(stub));

        Fake {
            inner: Arc::new(Inner {
                name,
                object,
                registry,
                allows_any_call: config.allows_any_call,
                declared: Mutex::new(declared),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The object whose members this fake replaces.
    pub fn object(&self) -> &Object {
        &self.inner.object
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn allows_any_call(&self) -> bool {
        self.inner.allows_any_call
    }

    /// Expect a call.
    ///
    /// If the member `name` is never called before
    /// [`verify`](crate::verify), verification fails.
    pub fn expects(&self, name: &str) -> CallBuilder {
        self.declare(Some(name), true)
    }

    /// Provide a call.
    ///
    /// The call acts as a stub: nothing fails if it is never made.
    pub fn provides(&self, name: &str) -> CallBuilder {
        self.declare(Some(name), false)
    }

    /// Expect the object itself to be called.
    pub fn expects_call(&self) -> CallBuilder {
        self.declare(None, true)
    }

    /// Allow the object itself to be called.
    pub fn is_callable(&self) -> CallBuilder {
        self.declare(None, false)
    }

    /// Sets a plain (non-callable) member on the object.
    pub fn has_attr(self, name: &str, value: impl Into<Value>) -> Self {
        self.inner.object.set(name, value);
        self
    }

    /// Sets the return value of the call on the object itself.
    pub fn returns(self, value: impl Into<Value>) -> Self {
        self.stub().set_return_value(value);
        self
    }

    /// Makes calling the object itself return a new fake; see
    /// [`CallBuilder::returns_fake`].
    pub fn returns_fake(&self) -> Fake {
        self.returns_fake_with(FakeConfig::default())
    }

    pub fn returns_fake_with(&self, config: FakeConfig) -> Fake {
        self.child_fake(&self.stub(), config)
    }

    pub fn with_args(self, args: impl IntoArguments) -> Self {
        self.stub().set_expected_args(args);
        self
    }

    pub fn with_arg_count(self, count: usize) -> Self {
        self.stub().set_expected_arg_count(count);
        self
    }

    pub fn with_kwarg_count(self, count: usize) -> Self {
        self.stub().set_expected_kwarg_count(count);
        self
    }

    pub fn calls(
        self,
        replacement: impl Fn(crate::Arguments) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.stub().set_replacement(Function::new(replacement));
        self
    }

    /// Calls the faked object itself.
    ///
    /// Answers with the object when [`CONSTRUCTOR`] is declared and
    /// through the stub when the fake is callable. Fails with
    /// [`Error::NotCallable`] otherwise.
    pub fn call(&self, args: impl IntoArguments) -> Result<Value> {
        self.inner.object.call(args)
    }

    /// Returns the member `name`, creating a stub for it when any call
    /// is allowed.
    ///
    /// Fails with [`Error::UndeclaredCall`] when the member was never
    /// declared and any call is not allowed.
    pub fn member(&self, name: &str) -> Result<Value> {
        self.inner.object.member(name)
    }

    /// Calls the member `name`, as the code under test would.
    pub fn invoke(&self, name: &str, args: impl IntoArguments) -> Result<Value> {
        self.inner.object.invoke(name, args)
    }

    /// The call currently configured for member `name`.
    pub fn declared_call(&self, name: &str) -> Option<Call> {
        self.inner
            .declared
            .lock()
            .get(&Some(name.to_string()))
            .and_then(Declared::current)
    }

    /// Names of every declared member.
    pub fn declared_names(&self) -> Vec<String> {
        self.inner.declared.lock().keys().flatten().cloned().collect()
    }

    /// The call made when the object itself is called.
    pub fn stub(&self) -> Call {
        let current = self
            .inner
            .declared
            .lock()
            .get(&None)
            .and_then(Declared::current);

        // the stub is declared on construction and is never removed
        current.unwrap_or_else(|| Call::provided(&self.inner.name, None))
    }

    fn declare(&self, member: Option<&str>, mandatory: bool) -> CallBuilder {
        let call = if mandatory {
            Call::expected(&self.inner.name, member)
        } else {
            Call::provided(&self.inner.name, member)
        };

        self.install(member, call.trampoline());
        self.inner.declared.lock().insert(
            member.map(str::to_string),
            Declared::Call(call.clone()),
        );
        if mandatory {
            self.inner.registry.expect_call(call.clone());
        }

        tracing::debug!(call = %call, mandatory, "declared call");
        CallBuilder {
            fake: self.clone(),
            member: member.map(str::to_string),
            call,
        }
    }

    fn install(&self, member: Option<&str>, function: Function) {
        let object = &self.inner.object;
        match member {
            None => object.set_call_hook(Some(function)),
            Some(name) => {
                object.set(name, function.clone());
                if name == CONSTRUCTOR {
                    let target = object.downgrade();
                    object.set_call_hook(Some(Function::new(move |args| {
                        function.call(args)?;
                        Ok(target.upgrade().map_or(Value::Null, Value::Object))
                    })));
                }
            }
        }
    }

    fn next_call(&self, member: Option<String>) -> CallBuilder {
        let (stack, created) = {
            let mut declared = self.inner.declared.lock();
            match declared.get(&member) {
                Some(Declared::Stack(stack)) => (stack.clone(), false),
                Some(Declared::Call(first)) => {
                    // lazily create a stack with the last declared call first
                    let stack = CallStack::new(first.clone());
                    declared.insert(member.clone(), Declared::Stack(stack.clone()));
                    (stack, true)
                }
                None => {
                    let stack = CallStack::new(Call::provided(&self.inner.name, member.as_deref()));
                    declared.insert(member.clone(), Declared::Stack(stack.clone()));
                    (stack, true)
                }
            }
        };

        if created {
            self.install(member.as_deref(), stack.trampoline());
            self.inner.registry.register_call_stack(stack.clone());
        }

        let call = if stack.is_expected() {
            Call::expected(&self.inner.name, member.as_deref())
        } else {
            Call::provided(&self.inner.name, member.as_deref())
        };
        stack.add_call(call.clone());
        if stack.is_expected() {
            self.inner.registry.expect_call(call.clone());
        }

        CallBuilder {
            fake: self.clone(),
            member,
            call,
        }
    }

    fn child_fake(&self, call: &Call, config: FakeConfig) -> Fake {
        let object = config.object.clone().unwrap_or_default();
        let child = Fake::over(
            self.inner.name.clone(),
            object.clone(),
            &config,
            self.inner.registry.clone(),
        );
        call.set_return_value(object);
        child
    }
}

impl fmt::Display for Fake {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&fake_repr(&self.inner.name))
    }
}

impl fmt::Debug for Fake {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fake")
            .field("name", &self.inner.name)
            .field("declared", &self.declared_names())
            .field("allows_any_call", &self.inner.allows_any_call)
            .finish()
    }
}

impl From<Fake> for Value {
    fn from(fake: Fake) -> Self {
        Value::Object(fake.inner.object.clone())
    }
}

/// Configures the call just declared on a [`Fake`].
///
/// Every method returns a builder so declarations chain:
///
/// ```
/// use fudge::{Fake, Object, Value};
///
/// let counter = Object::new();
/// Fake::wrap("counter", &counter)
///     .provides("increment")
///     .with_arg_count(1)
///     .returns(1)
///     .provides("reset");
///
/// assert_eq!(counter.invoke("increment", (5,)).unwrap(), Value::Int(1));
/// ```
#[derive(Debug)]
pub struct CallBuilder {
    fake: Fake,
    member: Option<String>,
    call: Call,
}

impl CallBuilder {
    /// Set a static value to return when the call is made.
    pub fn returns(self, value: impl Into<Value>) -> Self {
        self.call.set_return_value(value);
        self
    }

    /// Set the call to return a new [`Fake`].
    ///
    /// Unlike the other methods this returns the *new* fake, not this
    /// builder, so store it to declare its own calls.
    ///
    /// ```
    /// use fudge::{Fake, Object, Value};
    ///
    /// let session = Object::new();
    /// let query = Fake::wrap("session", &session).provides("query").returns_fake();
    /// query.provides("one").returns(vec!["object"]);
    ///
    /// let result = session.invoke("query", ()).unwrap().invoke("one", ()).unwrap();
    /// assert_eq!(result, Value::from(vec!["object"]));
    /// ```
    pub fn returns_fake(self) -> Fake {
        self.returns_fake_with(FakeConfig::default())
    }

    /// Like [`returns_fake`](CallBuilder::returns_fake), configuring the
    /// new fake with `config`. The new fake wraps `config.object` when
    /// set and a fresh object otherwise.
    pub fn returns_fake_with(self, config: FakeConfig) -> Fake {
        self.fake.child_fake(&self.call, config)
    }

    /// Set the call to expect specific arguments.
    pub fn with_args(self, args: impl IntoArguments) -> Self {
        self.call.set_expected_args(args);
        self
    }

    /// Set the call to expect an exact argument count.
    pub fn with_arg_count(self, count: usize) -> Self {
        self.call.set_expected_arg_count(count);
        self
    }

    /// Set the call to expect an exact count of keyword arguments.
    pub fn with_kwarg_count(self, count: usize) -> Self {
        self.call.set_expected_kwarg_count(count);
        self
    }

    /// Redefine the call: `replacement` runs instead and its result is
    /// returned.
    pub fn calls(
        self,
        replacement: impl Fn(crate::Arguments) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.call.set_replacement(Function::new(replacement));
        self
    }

    /// Start expecting or providing multiple calls.
    ///
    /// Up until calling this method, calls are infinite. Afterwards each
    /// call is answered by the next declaration in line, and calling
    /// past the last one fails.
    ///
    /// ```
    /// use fudge::{Fake, Object, Value};
    ///
    /// let f = Object::new();
    /// Fake::wrap("f", &f)
    ///     .provides("status")
    ///     .returns("Awake!")
    ///     .next_call()
    ///     .returns("Asleep");
    ///
    /// assert_eq!(f.invoke("status", ()).unwrap(), Value::from("Awake!"));
    /// assert_eq!(f.invoke("status", ()).unwrap(), Value::from("Asleep"));
    /// assert!(f.invoke("status", ()).is_err());
    /// ```
    pub fn next_call(self) -> Self {
        self.fake.next_call(self.member)
    }

    pub fn expects(self, name: &str) -> CallBuilder {
        self.fake.expects(name)
    }

    pub fn provides(self, name: &str) -> CallBuilder {
        self.fake.provides(name)
    }

    pub fn has_attr(self, name: &str, value: impl Into<Value>) -> Self {
        self.fake.inner.object.set(name, value);
        self
    }

    pub fn fake(&self) -> &Fake {
        &self.fake
    }

    /// The call being configured.
    pub fn call(&self) -> &Call {
        &self.call
    }

    pub fn into_fake(self) -> Fake {
        self.fake
    }
}

impl From<CallBuilder> for Fake {
    fn from(builder: CallBuilder) -> Self {
        builder.fake
    }
}
