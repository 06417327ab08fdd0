//! Procedural macros shared by the tessera crates.
//!
//! The only macro is [`macro@context`], which wraps the error of a function returning
//! `anyhow::Result` with a formatted message, so call sites do not have to repeat
//! `.with_context(|| …)` on every `?`.

mod args;

use crate::args::ContextArgs;
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::{ToTokens, quote};
use syn::{ItemFn, ReturnType, parse_macro_input};

/// Attach a formatted context message to the error returned by a function.
///
/// ```ignore
/// #[context("reading tile {level}/{x}/{y}")]
/// fn read(level: u8, x: u32, y: u32) -> anyhow::Result<Vec<u8>> { … }
/// ```
///
/// The arguments are passed to `format!` and only evaluated on the error path.
/// Prefix them with `move,` when the body consumes arguments that the message
/// does not reference.
#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let ContextArgs { move_token, message } = parse_macro_input!(args);
	let mut function = parse_macro_input!(input as ItemFn);

	if function.sig.asyncness.is_some() {
		return syn::Error::new_spanned(function.sig.fn_token, "#[context] does not support async functions")
			.to_compile_error()
			.into();
	}
	let return_type = match &function.sig.output {
		ReturnType::Default => {
			return syn::Error::new_spanned(function.sig.ident, "#[context] requires a function returning Result")
				.to_compile_error()
				.into();
		}
		ReturnType::Type(_, ty) => ty.clone(),
	};

	let body = &function.block;
	let err = Ident::new("err", Span::mixed_site());
	let once = Ident::new("once", Span::mixed_site());

	// The closure owns `once`, which keeps borrowck treating it as FnOnce.
	let wrapped = quote! {
		let #once = ::core::iter::empty::<()>();
		(#move_token || -> #return_type {
			::core::mem::drop(#once);
			#body
		})()
		.map_err(|#err| #err.context(format!(#message)).into())
	};
	function.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(wrapped), None)];

	function.into_token_stream().into()
}
