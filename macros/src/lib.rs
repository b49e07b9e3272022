//! Derive macro for confbind.
//!
//! `#[derive(Record)]` turns a struct with named fields into a field
//! descriptor table plus the accessor the binding engine walks.
//!
//! ```ignore
//! #[derive(Default, Record)]
//! #[env(rename_all = "PascalCase")]
//! pub struct Settings {
//!     pub port: u16,
//!
//!     #[env(key = "DATABASE_URL")]
//!     pub connection_string: String,
//!
//!     #[env(rename = "ID")]
//!     pub id: String,
//!
//!     #[env(skip)]
//!     pub cached: Vec<u8>,
//! }
//! ```
//!
//! # Attributes
//!
//! Struct-level:
//! - `#[env(rename_all = "...")]` - `UPPERCASE`, `lowercase`, `PascalCase`,
//!   `camelCase` or `SCREAMING_SNAKE_CASE`
//!
//! Field-level:
//! - `#[env(key = "X")]` - external lookup key, overrides the field name
//! - `#[env(rename = "X")]` - declared name used for the default key and
//!   for matching keys inside structured documents
//! - `#[env(skip)]` - invisible to the engine
//! - `#[env(embedded)]` - listed but never bound

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `confbind::Record` and `confbind::Bind` for a struct.
#[proc_macro_derive(Record, attributes(env))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::derive(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
