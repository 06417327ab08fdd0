use proc_macro2::TokenStream as TokenStream2;
use syn::{
	Token,
	parse::{Parse, ParseStream, Result},
};

/// Arguments of `#[context(...)]`: an optional leading `move,` followed by `format!` arguments.
#[derive(Debug)]
pub struct ContextArgs {
	pub move_token: Option<Token![move]>,
	pub message: TokenStream2,
}

impl Parse for ContextArgs {
	fn parse(input: ParseStream<'_>) -> Result<Self> {
		let move_token = if input.peek(Token![move]) {
			let token = input.parse()?;
			input.parse::<Token![,]>()?;
			Some(token)
		} else {
			None
		};
		let message: TokenStream2 = input.parse()?;
		if message.is_empty() {
			return Err(input.error("#[context] needs a message"));
		}
		Ok(Self { move_token, message })
	}
}

#[cfg(test)]
mod tests {
	use super::ContextArgs;
	use syn::parse_str;

	#[test]
	fn message_only() {
		let args: ContextArgs = parse_str("\"opening {}\", path").unwrap();
		assert!(args.move_token.is_none());
		assert_eq!(args.message.to_string(), "\"opening {}\" , path");
	}

	#[test]
	fn with_move() {
		let args: ContextArgs = parse_str("move, \"x = {x}\"").unwrap();
		assert!(args.move_token.is_some());
		assert_eq!(args.message.to_string(), "\"x = {x}\"");
	}

	#[test]
	fn move_without_comma_fails() {
		assert!(parse_str::<ContextArgs>("move \"x\"").is_err());
	}

	#[test]
	fn empty_message_fails() {
		assert!(parse_str::<ContextArgs>("").is_err());
	}
}
