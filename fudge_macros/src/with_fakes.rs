use darling::FromMeta;
use quote::quote;

#[derive(Default, FromMeta)]
#[darling(default)]
pub struct Args {
    clear_expectations: bool,
}

pub struct Wrapped {
    original: syn::ItemFn,
    args: Args,
}

impl Wrapped {
    pub fn new(original: syn::ItemFn, args: Args) -> darling::Result<Self> {
        if let Some(asyncness) = &original.sig.asyncness {
            return Err(darling::Error::custom(
                "#[with_fakes] does not support async functions",
            )
            .with_span(asyncness));
        }

        Ok(Wrapped { original, args })
    }
}

impl From<Wrapped> for proc_macro::TokenStream {
    fn from(wrapped: Wrapped) -> Self {
        let Wrapped { original, args } = wrapped;
        let syn::ItemFn {
            attrs,
            vis,
            sig,
            block,
        } = original;

        let output = body_output(&sig.output);
        let clear_expectations = args
            .clear_expectations
            .then(|| quote! { ::fudge::clear_expectations(); });

        proc_macro::TokenStream::from(quote! {
            #(#attrs)*
            #vis #sig {
                #clear_expectations
                ::fudge::clear_calls();
                let __fudge_output = (move || -> #output #block)();
                if let ::std::result::Result::Err(e) = ::fudge::verify() {
                    panic!("{}", e);
                }
                __fudge_output
            }
        })
    }
}

// the body runs in a closure so that an early `return` still reaches verification
pub fn body_output(output: &syn::ReturnType) -> proc_macro2::TokenStream {
    match output {
        syn::ReturnType::Default => quote! { () },
        syn::ReturnType::Type(_, ty) => quote! { #ty },
    }
}
