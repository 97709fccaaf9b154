use super::tokens::{AsyncTokens, Tokens};
use crate::error::ScanResult;

/// Field-by-field binding surface for record types.
///
/// `#[derive(FromJson)]` implements this alongside [`FromJson`]; the same
/// field dispatch then serves two callers:
///
/// - the object reader, which feeds it JSON property names, and
/// - the tabular row binder, which feeds it column names with the row's
///   values in column order.
///
/// Names are matched case-insensitively (ASCII). A field absent from the
/// input finishes as its type's default value.
///
/// [`FromJson`]: super::FromJson
pub trait JsonRecord: Sized {
    /// Accumulator for fields seen so far.
    type Partial: Default;

    /// Reads the value for `name` into the partial.
    ///
    /// Returns `Ok(false)` without consuming anything when `name` matches
    /// no field; the caller then skips the element.
    fn read_field(
        partial: &mut Self::Partial,
        name: &str,
        tokens: &mut dyn Tokens,
    ) -> ScanResult<bool>;

    /// Builds the record, defaulting any unseen fields.
    fn finish(partial: Self::Partial) -> Self;
}

/// The suspending twin of [`JsonRecord`].
pub trait JsonRecordAsync: JsonRecord {
    fn read_field_async<A: AsyncTokens>(
        partial: &mut Self::Partial,
        name: &str,
        tokens: &mut A,
    ) -> impl Future<Output = ScanResult<bool>>;
}
