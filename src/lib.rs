//! # Fudge
//!
//! Replace real objects with fakes (mocks, stubs) while testing.
//!
//! Code under test talks to collaborators through [`Object`]s: shared
//! records of named members that hold plain [`Value`]s or callable
//! [`Function`]s. A [`Fake`] installs replacement calls on such an
//! object. Calls it *expects* must be made before [`verify`]; calls it
//! *provides* are stubs that may be made any number of times.
//!
//! ```
//! use fudge::{Fake, Object, Value};
//!
//! // the code under test
//! fn sign_in(auth: &Object) -> fudge::Result<Value> {
//!     auth.invoke("login", ("joe", "secret"))?;
//!     auth.invoke("user", ())
//! }
//!
//! let auth = Object::new();
//! Fake::wrap("auth", &auth)
//!     .expects("login")
//!     .with_args(("joe", "secret"))
//!     .provides("user")
//!     .returns("Joe");
//!
//! assert_eq!(sign_in(&auth).unwrap(), Value::from("Joe"));
//! fudge::verify().unwrap();
//! ```
//!
//! Calls are made by name and are checked as they happen: calling a
//! member that was never declared, or with arguments that do not match
//! the declaration, answers with an [`Error`].
//!
//! ```
//! use fudge::{Error, Fake, Object};
//!
//! let db = Object::new();
//! Fake::wrap("db", &db)
//!     .provides("insert")
//!     .with_arg_count(2);
//!
//! assert!(matches!(
//!     db.invoke("insert", ("table",)),
//!     Err(Error::ArityMismatch { .. })
//! ));
//! assert!(matches!(
//!     db.invoke("delete", ()),
//!     Err(Error::UndeclaredCall { .. })
//! ));
//! ```
//!
//! Each thread has its own default [`Registry`], so tests running in
//! parallel do not observe each other's expectations. The test
//! attributes [`with_fakes`] and [`patch`] clear and verify it around a
//! test body.
//!
//! ```
//! #[fudge::with_fakes]
//! fn closes_the_session() {
//!     let session = fudge::Fake::new("session").unwrap();
//!     session.expects("close");
//!
//!     fudge::namespace::globals()
//!         .get("session")
//!         .unwrap()
//!         .invoke("close", ())
//!         .unwrap();
//! }
//! # closes_the_session();
//! ```

mod args;
mod call;
mod error;
mod fake;
pub mod matcher;
pub mod namespace;
pub mod patcher;
mod registry;
mod value;

pub use args::{Arguments, IntoArguments};
pub use call::{Call, CallStack};
pub use error::{ArgKind, Error, Result};
pub use fake::{CallBuilder, Fake, FakeBuilder, FakeConfig, CONSTRUCTOR};
pub use patcher::{patch_object, patched_context, with_patched_object, Patches};
pub use registry::Registry;
pub use value::{Function, Object, Value};

pub use fudge_macros::{patch, with_fakes};

/// The calling thread's default [`Registry`].
pub fn registry() -> Registry {
    Registry::current()
}

/// Forgets every call made so far; see [`Registry::clear_calls`].
pub fn clear_calls() {
    Registry::current().clear_calls()
}

/// Same as [`clear_calls`].
pub fn clear_actual_calls() {
    Registry::current().clear_actual_calls()
}

/// Drops every expectation; see [`Registry::clear_expectations`].
pub fn clear_expectations() {
    Registry::current().clear_expectations()
}

/// Clears calls and expectations.
pub fn clear_all() {
    Registry::current().clear_all()
}

/// Ensures every expected call was made; see [`Registry::verify`].
pub fn verify() -> Result<()> {
    Registry::current().verify()
}

/// Starts a test with fakes: forgets calls made by earlier tests.
/// Same as [`clear_calls`].
pub fn start() {
    clear_calls()
}

/// Ends a test with fakes: ensures every expected call was made.
/// Same as [`verify`].
pub fn stop() -> Result<()> {
    verify()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_functions_use_the_thread_registry() {
        let fake = Fake::new("top_level").unwrap();
        fake.expects("run");

        assert!(registry().ptr_eq(fake.registry()));
        assert!(verify().is_err());

        fake.invoke("run", ()).unwrap();
        assert!(verify().is_ok());

        clear_all();
        assert!(registry().is_empty());
    }

    #[test]
    fn start_and_stop_bracket_a_test() {
        let fake = Fake::new("bracketed").unwrap();
        fake.expects("run");
        fake.invoke("run", ()).unwrap();

        // calls from before start() do not count
        start();
        assert!(matches!(stop(), Err(Error::NotCalled { .. })));

        start();
        fake.invoke("run", ()).unwrap();
        assert!(stop().is_ok());
        clear_all();
    }
}
