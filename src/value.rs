//! The dynamic objects that fakes are installed into.
//!
//! Code under test talks to a faked collaborator through [`Object`]s:
//! named members hold [`Value`]s, and members holding a [`Function`]
//! can be invoked. A fake replaces those members with trampolines
//! that record and check each call.

use std::{
    collections::BTreeMap,
    fmt::{self, Formatter},
    sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::{matcher, Arguments, Error, IntoArguments, Result};

/// A dynamically typed value.
///
/// Equality is strict on type and value for scalars and structural
/// for objects (see [`matcher::values_match`]).
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(Object),
    Function(Function),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Calls this value: functions directly, objects through their
    /// call hook.
    pub fn call(&self, args: impl IntoArguments) -> Result<Value> {
        match self {
            Value::Function(f) => f.call(args),
            Value::Object(o) => o.call(args),
            other => Err(Error::NotCallable {
                target: other.to_string(),
            }),
        }
    }

    /// Invokes the member `name` of this value, which must be an object.
    pub fn invoke(&self, name: &str, args: impl IntoArguments) -> Result<Value> {
        match self {
            Value::Object(o) => o.invoke(name, args),
            other => Err(Error::UndeclaredCall {
                target: other.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        matcher::values_match(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

// `seen` holds the objects currently being written; meeting one again
// means the value contains itself, which is written as `{...}`
fn write_value(f: &mut Formatter<'_>, value: &Value, seen: &mut Vec<*const ()>) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{}", x),
        // i.e. 'yeah\'s'
        Value::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        Value::List(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item, seen)?;
            }
            f.write_str("]")
        }
        // i.e. {'debug': true, 'throttle': 1}
        Value::Object(o) => {
            let id = o.id();
            if seen.contains(&id) {
                return f.write_str("{...}");
            }

            seen.push(id);
            f.write_str("{")?;
            for (i, (k, v)) in o.entries().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "'{}': ", k.replace('\'', "\\'"))?;
                write_value(f, v, seen)?;
            }
            seen.pop();
            f.write_str("}")
        }
        Value::Function(_) => f.write_str("<function>"),
    }
}

pub(crate) fn write_joined<'v>(
    f: &mut Formatter<'_>,
    mut values: impl Iterator<Item = &'v Value>,
) -> fmt::Result {
    if let Some(first) = values.next() {
        write!(f, "{}", first)?;
    }
    values.try_for_each(|v| write!(f, ", {}", v))
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Int(i as i64)
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32, isize);

macro_rules! from_wide_int {
    ($($ty:ty),*) => {
        $(
            // values past `i64::MAX` keep their magnitude as a float
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
                }
            }
        )*
    };
}

from_wide_int!(u64, usize);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<&Object> for Value {
    fn from(o: &Object) -> Self {
        Value::Object(o.clone())
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

/// JSON objects become fresh [`Object`]s; numbers keep their integer
/// or float type.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(map) => {
                let object = Object::new();
                for (k, v) in map {
                    object.set(k, v);
                }
                Value::Object(object)
            }
        }
    }
}

type MissingMember = Arc<dyn Fn(&Object, &str) -> Option<Value> + Send + Sync>;

#[derive(Default)]
struct Members {
    label: Option<String>,
    members: BTreeMap<String, Value>,
    call_hook: Option<Function>,
    on_missing: Option<MissingMember>,
}

/// A shared, mutable record of named members.
///
/// Cloning an `Object` clones the handle: both clones see the same
/// members. No lock is held while a member function or hook runs, so
/// trampolines may freely re-enter the object they were called on.
#[derive(Clone, Default)]
pub struct Object {
    inner: Arc<Mutex<Members>>,
}

impl Object {
    pub fn new() -> Self {
        Object::default()
    }

    /// Creates an empty object with a label used in error messages.
    pub fn labelled(label: impl Into<String>) -> Self {
        let object = Object::new();
        object.set_label(label);
        object
    }

    pub fn label(&self) -> Option<String> {
        self.inner.lock().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.inner.lock().label = Some(label.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.lock().members.get(name).cloned()
    }

    /// Sets a member, returning the value it replaced.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        self.inner.lock().members.insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.lock().members.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().members.contains_key(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().members.keys().cloned().collect()
    }

    /// A snapshot of every member.
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.inner.lock().members.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().members.is_empty()
    }

    /// Makes the object itself callable (or not, with `None`).
    pub fn set_call_hook(&self, hook: Option<Function>) {
        self.inner.lock().call_hook = hook;
    }

    pub fn is_callable(&self) -> bool {
        self.inner.lock().call_hook.is_some()
    }

    /// Installs a hook consulted by [`member`](Object::member) when a
    /// member is absent.
    ///
    /// The hook receives the object and the member name. Returning
    /// `None` lets the lookup fail as usual.
    pub fn on_missing_member(
        &self,
        hook: impl Fn(&Object, &str) -> Option<Value> + Send + Sync + 'static,
    ) {
        self.inner.lock().on_missing = Some(Arc::new(hook));
    }

    /// Looks up a member, falling back to the missing-member hook.
    pub fn member(&self, name: &str) -> Result<Value> {
        let hook = {
            let members = self.inner.lock();
            if let Some(value) = members.members.get(name) {
                return Ok(value.clone());
            }
            members.on_missing.clone()
        };

        hook.and_then(|hook| hook(self, name))
            .ok_or_else(|| Error::UndeclaredCall {
                target: self.to_string(),
                name: name.to_string(),
            })
    }

    /// Calls the member `name` with `args`.
    pub fn invoke(&self, name: &str, args: impl IntoArguments) -> Result<Value> {
        match self.member(name)? {
            Value::Function(f) => f.call(args),
            Value::Object(o) if o.is_callable() => o.call(args),
            _ => Err(Error::NotCallable {
                target: format!("{}.{}", self, name),
            }),
        }
    }

    /// Calls the object itself through its call hook.
    pub fn call(&self, args: impl IntoArguments) -> Result<Value> {
        let hook = self.inner.lock().call_hook.clone();
        match hook {
            Some(hook) => hook.call(args),
            None => Err(Error::NotCallable {
                target: self.to_string(),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // identity of the shared members, for cycle detection
    pub(crate) fn id(&self) -> *const () {
        Arc::as_ptr(&self.inner) as *const ()
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.inner))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => f.write_str("<object>"),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // members may point back at this object so only list their names
        let members = self.inner.lock();
        f.debug_struct("Object")
            .field("label", &members.label)
            .field("members", &members.members.keys().collect::<Vec<_>>())
            .field("callable", &members.call_hook.is_some())
            .finish()
    }
}

pub(crate) struct WeakObject(Weak<Mutex<Members>>);

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(|inner| Object { inner })
    }
}

/// A callable value.
#[derive(Clone)]
pub struct Function(Arc<dyn Fn(Arguments) -> Result<Value> + Send + Sync>);

impl Function {
    pub fn new(f: impl Fn(Arguments) -> Result<Value> + Send + Sync + 'static) -> Self {
        Function(Arc::new(f))
    }

    pub fn call(&self, args: impl IntoArguments) -> Result<Value> {
        (self.0)(args.into_arguments())
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("<function>")
    }
}

/// Creates an [`Object`] from `key => value` pairs.
///
/// ```
/// let options = fudge::object! { "debug" => false, "throttle" => 1 };
/// assert_eq!(options.get("throttle"), Some(1.into()));
/// ```
#[macro_export]
macro_rules! object {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let object = $crate::Object::new();
        $( object.set($key, $value); )*
        object
    }};
}
