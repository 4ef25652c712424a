use std::{
    collections::BTreeMap,
    fmt::{self, Formatter},
};

use paste::paste;

use crate::{value::write_joined, Value};

/// The arguments of a single call: positional values plus named
/// (keyword) values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Arguments::default()
    }

    /// Appends a positional argument.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named argument, replacing any previous one of the same
    /// name.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Value>, BTreeMap<String, Value>) {
        (self.positional, self.named)
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(positional: Vec<Value>) -> Self {
        Arguments {
            positional,
            named: BTreeMap::new(),
        }
    }
}

/// `(a, b, key=c)`
impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_joined(f, self.positional.iter())?;
        let mut named = self.named.iter();
        if let Some((k, v)) = named.next() {
            if !self.positional.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        named.try_for_each(|(k, v)| write!(f, ", {}={}", k, v))?;
        f.write_str(")")
    }
}

/// Conversion into the [`Arguments`] of a call.
///
/// Implemented for `()`, [`Arguments`], `Vec<Value>`, and tuples of
/// up to ten elements that convert into [`Value`].
///
/// ```
/// use fudge::{Arguments, IntoArguments};
///
/// let args = ("joe", 25).into_arguments();
/// assert_eq!(args.len(), 2);
///
/// // note that single arguments are wrapped in a tuple
/// // don't forget the trailing comma to denote it is a tuple
/// let args = ("joe",).into_arguments();
/// assert_eq!(args.len(), 1);
/// ```
pub trait IntoArguments {
    fn into_arguments(self) -> Arguments;
}

impl IntoArguments for Arguments {
    fn into_arguments(self) -> Arguments {
        self
    }
}

impl IntoArguments for () {
    fn into_arguments(self) -> Arguments {
        Arguments::new()
    }
}

impl IntoArguments for Vec<Value> {
    fn into_arguments(self) -> Arguments {
        self.into()
    }
}

impl<A: Into<Value>> IntoArguments for (A,) {
    fn into_arguments(self) -> Arguments {
        Arguments::new().with(self.0)
    }
}

// (a,b,c) => tuple!(b,c)
macro_rules! peel {
    ($idx:tt, $($other:tt),+) => (tuple! { $($other),+ })
}

// implement IntoArguments for tuples of Into<Value>
macro_rules! tuple {
    ($idx:tt) => ();
    ($($idx:tt),+) => (
        paste! {
            impl<$([<A $idx>]: Into<Value>),+> IntoArguments for ($([<A $idx>],)+) {
                fn into_arguments(self) -> Arguments {
                    let ($([<a $idx>],)+) = self;
                    Arguments::new()$(.with([<a $idx>]))+
                }
            }
        }
        peel! { $($idx),+ }
    )
}

tuple! { 10, 9, 8, 7, 6, 5, 4, 3, 2, 1 }

/// Builds [`Arguments`], with named arguments after a `;`.
///
/// ```
/// let args = fudge::args!(25; table = "hits");
/// assert_eq!(args.to_string(), "(25, table='hits')");
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* ; $($name:ident = $value:expr),+ $(,)?) => {
        $crate::Arguments::new()$(.with($arg))*$(.with_named(stringify!($name), $value))+
    };
    ($($arg:expr),* $(,)?) => {
        $crate::Arguments::new()$(.with($arg))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuples_keep_their_order() {
        let args = (1, "two", 3.0, true).into_arguments();
        assert_eq!(
            args.positional(),
            &[
                Value::Int(1),
                Value::from("two"),
                Value::Float(3.0),
                Value::Bool(true)
            ]
        );
        assert_eq!(args.to_string(), "(1, 'two', 3, true)");
    }

    #[test]
    fn named_arguments() {
        let args = crate::args!(; username = "joe", password = "secret");
        assert_eq!(args.len(), 0);
        assert_eq!(args.named().len(), 2);
        assert_eq!(args.get_named("username"), Some(&Value::from("joe")));
        assert_eq!(args.to_string(), "(password='secret', username='joe')");
    }

    #[test]
    fn empty() {
        assert!(().into_arguments().is_empty());
        assert_eq!(crate::args!().to_string(), "()");
    }
}
