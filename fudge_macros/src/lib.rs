//! Test attributes for [fudge](https://docs.rs/fudge).

extern crate proc_macro;

mod patch;
mod with_fakes;

use darling::{export::NestedMeta, FromMeta};
use proc_macro::TokenStream;
use syn::{punctuated::Punctuated, LitStr, Token};

/// Clears calls before the test and verifies them after it.
///
/// With `#[with_fakes(clear_expectations)]` expectations declared before
/// the test are dropped too.
///
/// ```
/// #[fudge::with_fakes]
/// fn sends_the_report() {
///     let mailer = fudge::Object::new();
///     fudge::Fake::wrap("mailer", &mailer).expects("send");
///     mailer.invoke("send", ("report",)).unwrap();
/// }
/// # sends_the_report();
/// ```
#[proc_macro_attribute]
pub fn with_fakes(args: TokenStream, original: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(args.into())
        .map_err(darling::Error::from)
        .and_then(|v| with_fakes::Args::from_list(&v))
    {
        Ok(v) => v,
        Err(e) => return e.write_errors().into(),
    };

    let original = syn::parse_macro_input!(original as syn::ItemFn);
    match with_fakes::Wrapped::new(original, args) {
        Ok(wrapped) => TokenStream::from(wrapped),
        Err(e) => e.write_errors().into(),
    }
}

/// Patches each dotted path in the thread's globals with a new
/// `fudge::Fake` and passes the fakes to the test, in order.
///
/// The container of each path must exist. Expectations are verified
/// after the test and every patch is restored either way.
///
/// ```
/// use fudge::{namespace, Fake, Object};
///
/// #[fudge::patch("os.remove", "shutil.rmtree")]
/// fn cleans_up(remove: Fake, rmtree: Fake) {
///     remove.expects_call().with_args(("/tmp/build.log",));
///     rmtree.expects_call().with_args(("/tmp/build",));
///
///     let globals = namespace::globals();
///     let os = globals.get("os").unwrap();
///     let shutil = globals.get("shutil").unwrap();
///     os.invoke("remove", ("/tmp/build.log",)).unwrap();
///     shutil.invoke("rmtree", ("/tmp/build",)).unwrap();
/// }
///
/// namespace::globals().set("os", Object::new());
/// namespace::globals().set("shutil", Object::new());
/// cleans_up();
/// ```
#[proc_macro_attribute]
pub fn patch(args: TokenStream, original: TokenStream) -> TokenStream {
    let paths =
        syn::parse_macro_input!(args with Punctuated::<LitStr, Token![,]>::parse_terminated);
    let original = syn::parse_macro_input!(original as syn::ItemFn);

    match patch::Patched::new(paths, original) {
        Ok(patched) => TokenStream::from(patched),
        Err(e) => e.write_errors().into(),
    }
}
