use crate::error::ScanResult;
use crate::token::{TokenKind, TokenStage};

/// The scanner surface a value binder drives.
///
/// Implemented by every `TokenScanner`. The trait is object safe so that
/// binder code and registry readers can run over `&mut dyn Tokens` without
/// caring which character source backs the scanner.
///
/// # Positioning convention
///
/// A binder is invoked with the scanner positioned *on* the first token of
/// the value it owns, and must leave the scanner positioned on the first
/// token *after* that value. `read_text`/`read_value` follow the same
/// convention: they consume the current token in full and advance.
pub trait Tokens {
    /// Skips the rest of the current token and any whitespace, then
    /// classifies the next token. Returns `false` at end of input.
    fn next_token(&mut self) -> ScanResult<bool>;

    /// Kind of the current token.
    fn kind(&self) -> TokenKind;

    /// Delivery stage of the current token.
    fn stage(&self) -> TokenStage;

    /// Absolute position of the read cursor. Never decreases.
    fn position(&self) -> u64;

    /// True when the current number token contained a decimal point.
    fn has_decimal(&self) -> bool;

    /// True when the current number token contained an exponent.
    fn has_exponent(&self) -> bool;

    /// True when the current string token contained escape sequences.
    fn has_escapes(&self) -> bool;

    /// Raw length in bytes scanned for the current token so far.
    fn raw_len(&self) -> usize;

    /// Decoded length in characters for the current token so far.
    fn decoded_len(&self) -> usize;

    /// Produces the next chunk of the current token. Returns `false` once
    /// the token is exhausted.
    fn next_chunk(&mut self) -> ScanResult<bool>;

    /// Raw text of the chunk produced by the last `next_chunk` call.
    ///
    /// Fails with `ScanError::StaleChunk` once the scanner has advanced.
    fn text_chunk(&self) -> ScanResult<&str>;

    /// Decoded value of the chunk produced by the last `next_chunk` call.
    fn value_chunk(&self) -> ScanResult<&str>;

    /// Whole raw token text, if the token is fully in buffer.
    fn try_token_text(&self) -> Option<String>;

    /// Whole decoded token value, if the token is fully in buffer.
    fn try_token_value(&self) -> Option<String>;

    /// Consumes the current token, returning its full raw text, then
    /// advances to the next token.
    fn read_text(&mut self) -> ScanResult<String>;

    /// Consumes the current token, returning its full decoded value, then
    /// advances to the next token.
    fn read_value(&mut self) -> ScanResult<String>;

    /// Advances past the current element: a single token, or an entire
    /// balanced subtree when the current token opens a list or object.
    /// Leaves the scanner on the first token after the element.
    fn skip_element(&mut self) -> ScanResult<()>;

    /// Consumes the current element and returns its exact source text,
    /// whitespace included, then advances to the next token.
    fn read_element_text(&mut self) -> ScanResult<String>;

    /// Classifies the `index`-th upcoming token without consuming
    /// anything. Refills at most once; returns `TokenKind::Unknown` when
    /// the answer is still not buffered.
    fn peek_kind(&mut self, index: usize) -> ScanResult<TokenKind>;
}

/// The suspending twin of [`Tokens`], implemented by `AsyncTokenScanner`.
///
/// Method-for-method identical semantics; the suspension points are
/// exactly the operations that may require more input.
pub trait AsyncTokens {
    fn next_token(&mut self) -> impl Future<Output = ScanResult<bool>>;

    fn kind(&self) -> TokenKind;
    fn stage(&self) -> TokenStage;
    fn position(&self) -> u64;
    fn has_decimal(&self) -> bool;
    fn has_exponent(&self) -> bool;
    fn has_escapes(&self) -> bool;
    fn raw_len(&self) -> usize;
    fn decoded_len(&self) -> usize;

    fn next_chunk(&mut self) -> impl Future<Output = ScanResult<bool>>;
    fn text_chunk(&self) -> ScanResult<&str>;
    fn value_chunk(&self) -> ScanResult<&str>;
    fn try_token_text(&self) -> Option<String>;
    fn try_token_value(&self) -> Option<String>;

    fn read_text(&mut self) -> impl Future<Output = ScanResult<String>>;
    fn read_value(&mut self) -> impl Future<Output = ScanResult<String>>;
    fn skip_element(&mut self) -> impl Future<Output = ScanResult<()>>;
    fn read_element_text(&mut self) -> impl Future<Output = ScanResult<String>>;
    fn peek_kind(&mut self, index: usize) -> impl Future<Output = ScanResult<TokenKind>>;
}
