//! Token classification and per-token metadata.

/// The kind of the token the scanner is currently positioned on.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `[`
    ListStart,
    /// `{`
    ObjectStart,
    /// A string literal.
    String,
    /// A number literal.
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `]`
    ListEnd,
    /// `}`
    ObjectEnd,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// A run of whitespace. Only produced while whitespace-token mode is
    /// active during subtree text reconstruction.
    Whitespace,
    /// End of input at a valid token boundary.
    None,
    /// Not enough buffered input to decide. Only produced by peeking.
    Unknown,
    /// A lexically invalid character run.
    Error,
}

impl TokenKind {
    /// True for the kinds that can begin a JSON value.
    #[inline]
    pub const fn is_value_start(self) -> bool {
        matches!(
            self,
            TokenKind::ListStart
                | TokenKind::ObjectStart
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Nesting depth contribution of this token.
    #[inline]
    pub(crate) const fn depth_delta(self) -> i32 {
        match self {
            TokenKind::ListStart | TokenKind::ObjectStart => 1,
            TokenKind::ListEnd | TokenKind::ObjectEnd => -1,
            _ => 0,
        }
    }
}

/// Where the current token's text lives relative to the working buffer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStage {
    /// No token has been classified yet.
    #[default]
    Unread,
    /// The whole token is resident in the buffer and was scanned in one
    /// pass. One chunk call delivers it entirely.
    InBuffer,
    /// The token begins in the buffer but does not fit; no chunk has been
    /// delivered yet.
    Start,
    /// At least one chunk of a streamed token has been delivered.
    Interior,
    /// All chunks have been delivered; the token is consumed.
    End,
}

/// Metadata for the token the scanner is positioned on.
///
/// `start` is a byte offset into the working buffer and is shifted in step
/// with buffer compaction. `raw_len` and `decoded_len` accumulate as chunks
/// are delivered for streamed tokens; for `InBuffer` tokens they are final
/// at classification time.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenInfo {
    pub kind: TokenKind,
    pub stage: TokenStage,
    /// Byte offset of the token's first character within the buffer.
    pub start: usize,
    /// Raw length in bytes (total scanned so far for streamed tokens).
    pub raw_len: usize,
    /// Decoded length in characters after escape resolution.
    pub decoded_len: usize,
    pub has_decimal: bool,
    pub has_exponent: bool,
    pub has_escapes: bool,
}

impl Default for TokenKind {
    #[inline]
    fn default() -> Self {
        TokenKind::None
    }
}

impl TokenInfo {
    /// Resets to a fresh token of `kind` starting at `start`.
    pub(crate) fn reset(&mut self, kind: TokenKind, stage: TokenStage, start: usize) {
        *self = TokenInfo {
            kind,
            stage,
            start,
            ..TokenInfo::default()
        };
    }
}
