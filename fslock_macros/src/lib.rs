use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn};

/// Lock test case procedural macro
///
/// Turns a plain function into a `#[test]` that:
/// - Initializes the crate logger before the body runs
/// - Announces the test name and source file
/// - Reports success once the body returns
///
/// Attributes written on the function (e.g. `#[should_panic]`) are moved to the
/// generated test so the harness still sees them.
///
/// Usage:
/// ```ignore
/// #[lock_test]
/// fn recursive_lock_nests() { ... }
/// ```
#[proc_macro_attribute]
pub fn lock_test(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut input_fn = parse_macro_input!(input as ItemFn);
    let fn_name = input_fn.sig.ident.clone();

    // The wrapper becomes the test under the original name, the body moves
    // into a private function beside it.
    let body_name = format_ident!("__{}_lock_test_body", fn_name);
    let harness_attrs = core::mem::take(&mut input_fn.attrs);
    input_fn.sig.ident = body_name.clone();

    let output = quote! {
        #input_fn

        #(#harness_attrs)*
        #[test]
        fn #fn_name () {
            crate::logging::init();
            log::info!(
                "Testing > {} ({}) ...",
                stringify!(#fn_name),
                file!()
            );

            #body_name ();
            log::info!("========[{} passed]========", stringify!(#fn_name));
        }
    };

    output.into()
}
