#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Procedural macros for the jsonkit streaming JSON toolkit.
//!
//! [`derive@FromJson`] turns a named struct into a record binder: JSON
//! properties map onto fields case-insensitively, unknown properties are
//! skipped, and missing fields default. The derive also implements the
//! field-dispatch surface the tabular row binder reuses, so the same type
//! binds from objects and from table rows.

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod from_json;

/// Derives `FromJson`, `FromJsonAsync`, `JsonRecord`, and
/// `JsonRecordAsync` for a named struct.
///
/// # Field mapping
///
/// - Property names match field names ASCII-case-insensitively.
/// - `#[json(rename = "other")]` matches `other` instead of the field
///   name.
/// - A field absent from the input finishes as `Default::default()`, so
///   field types must implement `Default`. Wrap a field in `Option` when
///   absence must be observable.
/// - `#[json(default = expr)]` substitutes `expr` for an absent field
///   (and lifts the `Default` requirement for that field); bare
///   `#[json(default)]` states the ordinary defaulting explicitly.
///
/// # Example
///
/// ```ignore
/// use jsonkit::FromJson;
///
/// #[derive(FromJson, Default, Debug)]
/// struct Employee {
///     id: i64,
///     name: String,
///     reports: Vec<Employee>,
/// }
///
/// let boss: Employee =
///     jsonkit::from_json_text(r#"{"Id": 1, "name": "a", "reports": []}"#)?;
/// ```
#[proc_macro_derive(FromJson, attributes(json))]
pub fn derive_from_json(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    from_json::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
