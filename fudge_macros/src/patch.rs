use quote::{format_ident, quote};
use syn::{punctuated::Punctuated, LitStr, Token};

use crate::with_fakes::body_output;

pub struct Patched {
    paths: Vec<LitStr>,
    // one binding per path, taken out of the signature
    fakes: Vec<syn::PatType>,
    original: syn::ItemFn,
}

impl Patched {
    pub fn new(
        paths: Punctuated<LitStr, Token![,]>,
        mut original: syn::ItemFn,
    ) -> darling::Result<Self> {
        if let Some(asyncness) = &original.sig.asyncness {
            return Err(
                darling::Error::custom("#[patch] does not support async functions")
                    .with_span(asyncness),
            );
        }

        if paths.is_empty() {
            return Err(darling::Error::custom(
                "#[patch] needs at least one path, e.g. #[patch(\"os.remove\")]",
            )
            .with_span(&original.sig.ident));
        }

        let mut errors = darling::Error::accumulator();
        for path in &paths {
            if !path.value().contains('.') {
                errors.push(
                    darling::Error::custom(
                        "need a valid target to patch, e.g. \"container.attribute\"",
                    )
                    .with_span(path),
                );
            }
        }

        let mut fakes = Vec::with_capacity(original.sig.inputs.len());
        for input in &original.sig.inputs {
            match input {
                syn::FnArg::Typed(fake) => fakes.push(fake.clone()),
                syn::FnArg::Receiver(receiver) => errors.push(
                    darling::Error::custom("#[patch] cannot be used on methods")
                        .with_span(receiver),
                ),
            }
        }
        errors.finish()?;

        if fakes.len() != paths.len() {
            return Err(darling::Error::custom(format!(
                "#[patch] was given {} path(s) but `{}` takes {} fake(s)",
                paths.len(),
                original.sig.ident,
                fakes.len()
            ))
            .with_span(&original.sig.inputs));
        }

        original.sig.inputs.clear();
        Ok(Patched {
            paths: paths.into_iter().collect(),
            fakes,
            original,
        })
    }
}

impl From<Patched> for proc_macro::TokenStream {
    fn from(patched: Patched) -> Self {
        let Patched {
            paths,
            fakes,
            original,
        } = patched;
        let syn::ItemFn {
            attrs,
            vis,
            sig,
            block,
        } = original;

        let output = body_output(&sig.output);
        let patches = format_ident!("__fudge_patches");
        let bindings = fakes.iter().enumerate().map(|(index, fake)| {
            let syn::PatType { pat, ty, .. } = fake;
            quote! {
                let #pat: #ty = ::std::clone::Clone::clone(&#patches.fakes()[#index]);
            }
        });

        proc_macro::TokenStream::from(quote! {
            #(#attrs)*
            #vis #sig {
                let #patches = match ::fudge::Patches::enter(&[#(#paths),*]) {
                    ::std::result::Result::Ok(patches) => patches,
                    ::std::result::Result::Err(e) => panic!("{}", e),
                };
                let __fudge_output = {
                    #(#bindings)*
                    (move || -> #output #block)()
                };
                if let ::std::result::Result::Err(e) = #patches.exit() {
                    panic!("{}", e);
                }
                __fudge_output
            }
        })
    }
}
