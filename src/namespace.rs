//! Dotted-name resolution.
//!
//! A [`Fake`](crate::Fake) created by name, e.g. `Fake::new("app.db")`,
//! replaces the object found by descending `app` then `db` from a root
//! container. Containers missing along the way are created, which
//! mutates the root: this is how fakes for collaborators that do not
//! exist yet become reachable by the code under test.

use crate::{Error, Object, Result, Value};

thread_local! {
    static GLOBALS: Object = Object::labelled("globals");
}

/// The calling thread's root container, used when a fake is created
/// by name without an explicit root.
pub fn globals() -> Object {
    GLOBALS.with(Object::clone)
}

/// Descends `path` under `root`, creating empty containers for missing
/// segments, and returns the last one.
///
/// ```
/// use fudge::{namespace, Object};
///
/// let root = Object::new();
/// let baz = namespace::resolve(&root, "foo.bar.baz").unwrap();
/// let foo = root.get("foo").unwrap();
/// assert!(foo.as_object().unwrap().contains("bar"));
/// assert_eq!(baz.to_string(), "foo.bar.baz");
/// ```
pub fn resolve(root: &Object, path: &str) -> Result<Object> {
    let segments = segments(path)?;
    let mut parent = root.clone();

    for (depth, segment) in segments.iter().enumerate() {
        let child = match parent.get(segment) {
            Some(Value::Object(child)) => child,
            // lazily create objects that don't exist
            None | Some(Value::Null) => {
                let child = Object::labelled(segments[..=depth].join("."));
                parent.set(*segment, child.clone());
                tracing::debug!(path = %child, "created namespace object");
                child
            }
            Some(other) => {
                return Err(Error::invalid_name(
                    path,
                    format!("'{}' is not an object (it is: {})", segment, other),
                ))
            }
        };
        parent = child;
    }

    Ok(parent)
}

/// Descends `path` under `root` without creating anything.
///
/// Returns `Ok(None)` when a segment is missing.
pub fn lookup(root: &Object, path: &str) -> Result<Option<Value>> {
    let segments = segments(path)?;
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(None),
    };

    let mut parent = root.clone();
    for segment in parents {
        parent = match parent.get(segment) {
            Some(Value::Object(child)) => child,
            Some(other) => {
                return Err(Error::invalid_name(
                    path,
                    format!("'{}' is not an object (it is: {})", segment, other),
                ))
            }
            None => return Ok(None),
        };
    }

    Ok(parent.get(last))
}

fn segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::invalid_name(path, "empty name"));
    }

    let segments: Vec<_> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::invalid_name(path, "empty path segment"));
    }
    Ok(segments)
}
