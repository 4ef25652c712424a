//! Temporarily replacing members of real objects.
//!
//! ```
//! use fudge::{patcher, Object, Value};
//!
//! let os = Object::new();
//! os.set("sep", "/");
//!
//! patcher::with_patched_object(&os, "sep", "\\", || {
//!     assert_eq!(os.get("sep"), Some(Value::from("\\")));
//! });
//! assert_eq!(os.get("sep"), Some(Value::from("/")));
//! ```

use crate::{namespace, Error, Fake, Object, Registry, Result, Value};

/// Replaces `object.attr` with `value` until
/// [`restore`](PatchHandler::restore) is called.
///
/// ```
/// use fudge::{patcher::patch_object, Object, Value};
///
/// let session = Object::new();
/// let handle = patch_object(&session, "user", "bob");
/// assert_eq!(session.get("user"), Some(Value::from("bob")));
///
/// handle.restore();
/// assert!(!session.contains("user"));
/// ```
pub fn patch_object(object: &Object, attr: &str, value: impl Into<Value>) -> PatchHandler {
    let original = object.set(attr, value);
    tracing::debug!(object = %object, attr, "patched member");
    PatchHandler {
        object: object.clone(),
        attr: attr.to_string(),
        original,
    }
}

/// Like [`patch_object`], restoring the member when the guard is dropped.
pub fn patched_context(object: &Object, attr: &str, value: impl Into<Value>) -> PatchGuard {
    PatchGuard {
        handler: Some(patch_object(object, attr, value)),
    }
}

/// Runs `f` with `object.attr` replaced by `value`. The member is
/// restored afterwards, even if `f` panics.
pub fn with_patched_object<R>(
    object: &Object,
    attr: &str,
    value: impl Into<Value>,
    f: impl FnOnce() -> R,
) -> R {
    let _guard = patched_context(object, attr, value);
    f()
}

/// A member replaced by [`patch_object`].
#[derive(Debug)]
#[must_use = "the member stays patched until restored"]
pub struct PatchHandler {
    object: Object,
    attr: String,
    original: Option<Value>,
}

impl PatchHandler {
    /// The replaced value, `None` if the member did not exist.
    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// Puts the original member back, or removes the member if there
    /// was none.
    pub fn restore(self) {
        match self.original {
            Some(original) => {
                self.object.set(self.attr.as_str(), original);
            }
            None => {
                self.object.remove(&self.attr);
            }
        }
        tracing::debug!(object = %self.object, attr = %self.attr, "restored member");
    }
}

/// Restores a patched member on drop.
#[derive(Debug)]
pub struct PatchGuard {
    handler: Option<PatchHandler>,
}

impl PatchGuard {
    pub fn original(&self) -> Option<&Value> {
        self.handler.as_ref().and_then(PatchHandler::original)
    }
}

impl Drop for PatchGuard {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.restore();
        }
    }
}

/// Fakes patched in place of dotted paths for the duration of a test.
///
/// Entering clears every expectation and call of the thread's registry,
/// so fakes must be declared after entering. [`exit`](Patches::exit)
/// verifies; dropping without exiting only restores.
///
/// ```
/// use fudge::{namespace, patcher::Patches, Object};
///
/// namespace::globals().set("os", Object::new());
///
/// let patches = Patches::enter(&["os.remove"]).unwrap();
/// patches.fake(0).unwrap().expects_call();
///
/// let os = namespace::globals().get("os").unwrap();
/// os.invoke("remove", ("/tmp/x",)).unwrap();
///
/// patches.exit().unwrap();
/// let os = namespace::globals().get("os").unwrap();
/// assert!(!os.as_object().unwrap().contains("remove"));
/// ```
#[derive(Debug)]
pub struct Patches {
    handlers: Vec<PatchHandler>,
    fakes: Vec<Fake>,
    registry: Registry,
}

impl Patches {
    /// Patches each path under [`namespace::globals`].
    pub fn enter(paths: &[&str]) -> Result<Self> {
        Patches::enter_in(&namespace::globals(), paths)
    }

    /// Patches each `"container.path.attr"` under `root` with a new
    /// [`Fake`] named after the whole path.
    ///
    /// The container must already exist. On error, patches applied so far
    /// are restored.
    pub fn enter_in(root: &Object, paths: &[&str]) -> Result<Self> {
        let registry = Registry::current();
        registry.clear_expectations();
        registry.clear_calls();

        let mut patches = Patches {
            handlers: Vec::with_capacity(paths.len()),
            fakes: Vec::with_capacity(paths.len()),
            registry,
        };

        for path in paths {
            let (container, attr) = path.rsplit_once('.').ok_or_else(|| {
                Error::invalid_name(path, "need a valid target to patch")
            })?;

            let target = match namespace::lookup(root, container)? {
                Some(Value::Object(target)) => target,
                Some(other) => {
                    return Err(Error::invalid_name(
                        path,
                        format!("'{}' is not an object (it is: {})", container, other),
                    ))
                }
                None => {
                    return Err(Error::invalid_name(
                        path,
                        format!("'{}' does not exist", container),
                    ))
                }
            };

            let fake = Fake::builder(path)
                .object(&Object::new())
                .registry(&patches.registry)
                .build()?;
            patches
                .handlers
                .push(patch_object(&target, attr, fake.object()));
            patches.fakes.push(fake);
        }

        Ok(patches)
    }

    /// The fakes, in the order their paths were given.
    pub fn fakes(&self) -> &[Fake] {
        &self.fakes
    }

    pub fn fake(&self, index: usize) -> Option<&Fake> {
        self.fakes.get(index)
    }

    /// Verifies the expectations, then restores every patch and clears
    /// expectations whatever the outcome.
    pub fn exit(mut self) -> Result<()> {
        let verified = self.registry.verify();
        self.teardown();
        verified
    }

    fn teardown(&mut self) {
        // restore in reverse so overlapping paths unwind correctly
        while let Some(handler) = self.handlers.pop() {
            handler.restore();
        }
        self.registry.clear_expectations();
    }
}

impl Drop for Patches {
    fn drop(&mut self) {
        if !self.handlers.is_empty() {
            self.teardown();
        }
    }
}
