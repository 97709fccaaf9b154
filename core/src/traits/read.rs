use super::tokens::{AsyncTokens, Tokens};
use crate::error::ScanResult;

/// Binds the current JSON element into a value of the implementing type.
///
/// Implementations are permissive: a shape mismatch skips the element and
/// yields the type's default rather than failing, and unparseable scalar
/// text yields the default. The one hard rule is positional: `from_json`
/// is entered with the scanner on the first token of the element and must
/// leave it on the first token after the element, whatever branch is
/// taken.
///
/// Derive with `#[derive(FromJson)]` for named structs, or implement by
/// hand over the [`Tokens`] surface.
pub trait FromJson: Sized {
    /// Reads one element from the scanner.
    fn from_json(tokens: &mut dyn Tokens) -> ScanResult<Self>;
}

/// The suspending twin of [`FromJson`].
///
/// Semantics are identical; the generic parameter stands in for the
/// object-safe scanner handle because suspending traits cannot be erased.
pub trait FromJsonAsync: Sized {
    /// Reads one element from the suspending scanner.
    fn from_json_async<A: AsyncTokens>(
        tokens: &mut A,
    ) -> impl Future<Output = ScanResult<Self>>;
}
