//! Argument comparison and call formatting.
//!
//! There is no matcher DSL: an expected argument list matches when it
//! is equal to the actual one. Scalars must match in type and value;
//! objects match when they hold the same keys with matching values,
//! regardless of key order.

use std::collections::BTreeMap;

use crate::{Arguments, Value};

/// Returns `true` when `actual` matches `expected` position by position.
///
/// ```
/// use fudge::{matcher, object, Value};
///
/// let expected = [Value::from("one"), object! { "debug" => false }.into()];
/// let actual = [Value::from("one"), object! { "debug" => false }.into()];
/// assert!(matcher::args_are_equal(&actual, &expected));
/// assert!(!matcher::args_are_equal(&actual[..1], &expected));
/// ```
pub fn args_are_equal(actual: &[Value], expected: &[Value]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(actual, expected)| values_match(actual, expected))
}

/// Returns `true` when both named argument maps hold the same names
/// with matching values.
pub fn kwargs_are_equal(
    actual: &BTreeMap<String, Value>,
    expected: &BTreeMap<String, Value>,
) -> bool {
    same_members(actual, expected, &mut Vec::new())
}

/// Compares a single actual value against an expected one.
///
/// Objects that contain themselves are compared without looping: a
/// pair of objects met again while already being compared is taken as
/// matching.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected, &mut Vec::new())
}

// `pending` holds the pairs of objects currently being compared
fn compare(actual: &Value, expected: &Value, pending: &mut Vec<(*const (), *const ())>) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => {
            if actual.ptr_eq(expected) {
                return true;
            }
            let pair = (actual.id(), expected.id());
            if pending.contains(&pair) {
                return true;
            }

            pending.push(pair);
            // snapshot each side so that no two objects are ever locked at once
            let same = same_members(&actual.entries(), &expected.entries(), pending);
            pending.pop();
            same
        }
        (Value::List(actual), Value::List(expected)) => {
            actual.len() == expected.len()
                && actual
                    .iter()
                    .zip(expected)
                    .all(|(actual, expected)| compare(actual, expected, pending))
        }
        (Value::Function(actual), Value::Function(expected)) => actual.ptr_eq(expected),
        (Value::Null, Value::Null) => true,
        (Value::Bool(actual), Value::Bool(expected)) => actual == expected,
        (Value::Int(actual), Value::Int(expected)) => actual == expected,
        (Value::Float(actual), Value::Float(expected)) => actual == expected,
        (Value::Str(actual), Value::Str(expected)) => actual == expected,
        _ => false,
    }
}

// every key of one side must exist in the other with a matching value
fn same_members(
    actual: &BTreeMap<String, Value>,
    expected: &BTreeMap<String, Value>,
    pending: &mut Vec<(*const (), *const ())>,
) -> bool {
    actual.len() == expected.len()
        && actual.iter().all(|(key, value)| {
            expected
                .get(key)
                .map_or(false, |other| compare(value, other, pending))
        })
}

/// Formats positional arguments as they would appear in a call.
///
/// ```
/// use fudge::{matcher::repr_call_args, object, Value};
///
/// let args = [
///     Value::from("yeah's"),
///     object! { "debug" => true, "when" => "now" }.into(),
/// ];
/// assert_eq!(
///     repr_call_args(&args),
///     "('yeah\\'s', {'debug': true, 'when': 'now'})"
/// );
/// ```
pub fn repr_call_args(args: &[Value]) -> String {
    Arguments::from(args.to_vec()).to_string()
}

/// Formats named arguments as `key=value, ...`.
pub(crate) fn repr_kwargs(kwargs: &BTreeMap<String, Value>) -> String {
    kwargs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats an expectation's arguments, `()` when nothing is expected.
pub(crate) fn repr_expected(
    args: Option<&[Value]>,
    kwargs: Option<&BTreeMap<String, Value>>,
) -> String {
    let positional = args.map(<[Value]>::to_vec).unwrap_or_default();
    let named = kwargs.cloned().unwrap_or_default();

    named
        .into_iter()
        .fold(Arguments::from(positional), |args, (k, v)| args.with_named(k, v))
        .to_string()
}
