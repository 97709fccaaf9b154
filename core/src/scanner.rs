//! The pull-style token scanner.
//!
//! [`ScanCore`] is a resumable state machine over the character buffer:
//! every operation is a `poll_*` method that either completes with
//! [`Step::Ready`] or reports [`Step::Need`] when it ran out of buffered
//! input. The synchronous [`TokenScanner`] and the suspending
//! `AsyncTokenScanner` are thin drivers that loop a poll against their
//! fill primitive, which keeps the two flavors semantically identical by
//! construction.
//!
//! Tokens are classified without being consumed: after `next_token` the
//! cursor rests on the token's first character. Consumption happens
//! through chunk delivery (`next_chunk`) or implicitly when the next
//! `next_token` call skips whatever remains of the current token.

use crate::buffer::{CharBuffer, NUL};
use crate::config::ScanConfig;
use crate::decode::walk_interior;
use crate::error::ScanResult;
use crate::source::TextSource;
use crate::token::{TokenInfo, TokenKind, TokenStage};
use crate::traits::{CharSource, DynSource, Tokens};

/// Outcome of one poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step<T> {
    /// The operation completed.
    Ready(T),
    /// More input must be filled into the buffer before retrying.
    Need,
}

use Step::{Need, Ready};

/// Resumable element-walk phase for `next_element_chunk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkPhase {
    /// Delegating to the current literal token's own chunks.
    Literal,
    /// Walking a balanced subtree, consuming in-buffer tokens.
    Tree { depth: i32 },
    /// Streaming an oversized token's raw chunks inside a subtree.
    TreeToken { depth: i32 },
}

#[derive(Debug)]
pub(crate) struct ScanCore {
    buf: CharBuffer,
    token: TokenInfo,
    /// Decoded value of the most recent chunk (strings only).
    decoded: String,
    /// Raw byte range of the most recent chunk within the buffer.
    chunk_start: usize,
    chunk_end: usize,
    /// Bumped on every mutation; chunk views carry the serial they were
    /// produced under and go stale when it changes.
    serial: u64,
    chunk_serial: u64,
    /// Whitespace runs classify as tokens while set.
    ws_tokens: bool,
    /// The next fill may grow the buffer.
    want_grow: bool,
    /// Resumable depth for `skip_element`.
    skip_depth: Option<i32>,
    /// Resumable phase for `next_element_chunk`.
    walk: Option<WalkPhase>,
}

impl ScanCore {
    pub(crate) fn new(config: &ScanConfig) -> Self {
        Self {
            buf: CharBuffer::new(config),
            token: TokenInfo::default(),
            decoded: String::new(),
            chunk_start: 0,
            chunk_end: 0,
            serial: 0,
            chunk_serial: 0,
            ws_tokens: false,
            want_grow: false,
            skip_depth: None,
            walk: None,
        }
    }

    #[inline]
    fn bump(&mut self) {
        self.serial = self.serial.wrapping_add(1);
    }

    // --- accessors -------------------------------------------------------

    #[inline]
    pub(crate) fn kind(&self) -> TokenKind {
        self.token.kind
    }

    #[inline]
    pub(crate) fn stage(&self) -> TokenStage {
        self.token.stage
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.buf.position()
    }

    #[inline]
    pub(crate) fn has_decimal(&self) -> bool {
        self.token.has_decimal
    }

    #[inline]
    pub(crate) fn has_exponent(&self) -> bool {
        self.token.has_exponent
    }

    #[inline]
    pub(crate) fn has_escapes(&self) -> bool {
        self.token.has_escapes
    }

    #[inline]
    pub(crate) fn raw_len(&self) -> usize {
        self.token.raw_len
    }

    #[inline]
    pub(crate) fn decoded_len(&self) -> usize {
        self.token.decoded_len
    }

    #[inline]
    pub(crate) fn set_ws_tokens(&mut self, on: bool) {
        self.ws_tokens = on;
    }

    // --- fill bookkeeping ------------------------------------------------

    /// Compacts (and grows, when requested) ahead of a source read.
    /// Returns the free tail capacity in bytes.
    pub(crate) fn make_room(&mut self) -> ScanResult<usize> {
        let grow = std::mem::take(&mut self.want_grow);
        let (shift, free) = self.buf.make_room(self.buf.cursor(), grow)?;
        if shift > 0 {
            self.token.start = self.token.start.saturating_sub(shift);
        }
        Ok(free)
    }

    /// Mutable string the source appends into.
    #[inline]
    pub(crate) fn fill_sink(&mut self) -> &mut String {
        self.buf.sink()
    }

    /// Records the result of a source read.
    pub(crate) fn note_filled(&mut self, bytes: usize) {
        if bytes == 0 {
            self.buf.mark_done();
        }
        self.bump();
    }

    // --- token classification -------------------------------------------

    /// True when the in-progress token occupies the entire buffer, so no
    /// fill can add to it without growth.
    fn fills_buffer(&self) -> bool {
        self.buf.cursor() == 0 && self.buf.len() == self.buf.capacity()
    }

    pub(crate) fn poll_next_token(&mut self) -> ScanResult<Step<bool>> {
        // Skip whatever remains of the current token.
        if self.token.stage == TokenStage::InBuffer {
            self.buf.advance(self.token.raw_len);
            self.token.stage = TokenStage::End;
            self.bump();
        }
        while matches!(self.token.stage, TokenStage::Start | TokenStage::Interior) {
            match self.poll_next_chunk()? {
                Need => return Ok(Need),
                Ready(true) => {}
                Ready(false) => break,
            }
        }

        loop {
            let c = self.buf.peek(0);
            if c == NUL && self.buf.rest().is_empty() {
                if self.buf.is_done() {
                    let cursor = self.buf.cursor();
                    self.token.reset(TokenKind::None, TokenStage::End, cursor);
                    // End of input has an empty chunk, not a stale one.
                    self.emit_chunk(cursor, cursor);
                    return Ok(Ready(false));
                }
                return Ok(Need);
            }
            if c.is_whitespace() {
                let rest = self.buf.rest();
                if self.ws_tokens {
                    return self.classify_whitespace();
                }
                let skip = rest
                    .find(|ch: char| !ch.is_whitespace())
                    .unwrap_or(rest.len());
                self.buf.advance(skip);
                self.bump();
                continue;
            }
            return self.classify_at(c);
        }
    }

    fn classify_at(&mut self, c: char) -> ScanResult<Step<bool>> {
        let start = self.buf.cursor();
        let punct = |kind| (kind, 1usize);
        let (kind, len) = match c {
            '[' => punct(TokenKind::ListStart),
            ']' => punct(TokenKind::ListEnd),
            '{' => punct(TokenKind::ObjectStart),
            '}' => punct(TokenKind::ObjectEnd),
            ',' => punct(TokenKind::Comma),
            ':' => punct(TokenKind::Colon),
            '"' => return self.classify_string(start),
            '-' | '0'..='9' => return self.classify_number(start),
            'a'..='z' | 'A'..='Z' => return self.classify_word(start),
            other => (TokenKind::Error, other.len_utf8()),
        };
        self.token.reset(kind, TokenStage::InBuffer, start);
        self.token.raw_len = len;
        self.token.decoded_len = 1;
        Ok(Ready(true))
    }

    fn classify_string(&mut self, start: usize) -> ScanResult<Step<bool>> {
        let interior = &self.buf.rest()[1..];
        let outcome = walk_interior(interior, None, usize::MAX, self.buf.is_done());
        if outcome.ended || self.buf.is_done() {
            self.token.reset(TokenKind::String, TokenStage::InBuffer, start);
            self.token.raw_len = 1 + outcome.consumed;
            self.token.decoded_len = outcome.chars;
            self.token.has_escapes = outcome.has_escapes;
            Ok(Ready(true))
        } else if self.fills_buffer() {
            self.token.reset(TokenKind::String, TokenStage::Start, start);
            Ok(Ready(true))
        } else {
            Ok(Need)
        }
    }

    fn classify_number(&mut self, start: usize) -> ScanResult<Step<bool>> {
        let scan = scan_number(self.buf.rest());
        if scan.terminated || self.buf.is_done() {
            self.token.reset(TokenKind::Number, TokenStage::InBuffer, start);
            self.token.raw_len = scan.len;
            self.token.decoded_len = scan.len;
            self.token.has_decimal = scan.has_decimal;
            self.token.has_exponent = scan.has_exponent;
            Ok(Ready(true))
        } else if self.fills_buffer() {
            self.token.reset(TokenKind::Number, TokenStage::Start, start);
            self.token.has_decimal = scan.has_decimal;
            self.token.has_exponent = scan.has_exponent;
            Ok(Ready(true))
        } else {
            Ok(Need)
        }
    }

    fn classify_word(&mut self, start: usize) -> ScanResult<Step<bool>> {
        let rest = self.buf.rest();
        let run = rest
            .find(|ch: char| !ch.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let terminated = run < rest.len();
        if terminated || self.buf.is_done() {
            let kind = match &rest[..run] {
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                "null" => TokenKind::Null,
                _ => TokenKind::Error,
            };
            self.token.reset(kind, TokenStage::InBuffer, start);
            self.token.raw_len = run;
            self.token.decoded_len = run;
            Ok(Ready(true))
        } else {
            // A letter run longer than the whole buffer can only be
            // classified by growing; the chunked path never grows.
            if self.fills_buffer() {
                self.want_grow = true;
            }
            Ok(Need)
        }
    }

    fn classify_whitespace(&mut self) -> ScanResult<Step<bool>> {
        let start = self.buf.cursor();
        let rest = self.buf.rest();
        let run = rest
            .find(|ch: char| !ch.is_whitespace())
            .unwrap_or(rest.len());
        let terminated = run < rest.len();
        if terminated || self.buf.is_done() {
            self.token
                .reset(TokenKind::Whitespace, TokenStage::InBuffer, start);
            self.token.raw_len = run;
            self.token.decoded_len = rest[..run].chars().count();
            Ok(Ready(true))
        } else if self.fills_buffer() {
            self.token
                .reset(TokenKind::Whitespace, TokenStage::Start, start);
            Ok(Ready(true))
        } else {
            Ok(Need)
        }
    }

    // --- chunk delivery --------------------------------------------------

    pub(crate) fn poll_next_chunk(&mut self) -> ScanResult<Step<bool>> {
        match self.token.stage {
            TokenStage::Unread | TokenStage::End => Ok(Ready(false)),
            TokenStage::InBuffer => {
                let start = self.token.start;
                let len = self.token.raw_len;
                self.decoded.clear();
                if self.token.kind == TokenKind::String {
                    let interior = self.buf.slice(start + 1, start + len);
                    walk_interior(interior, Some(&mut self.decoded), usize::MAX, true);
                }
                self.buf.advance(len);
                self.token.stage = TokenStage::End;
                self.bump();
                self.chunk_start = start;
                self.chunk_end = start + len;
                self.chunk_serial = self.serial;
                Ok(Ready(true))
            }
            TokenStage::Start | TokenStage::Interior => {
                if self.token.kind == TokenKind::String {
                    self.poll_string_chunk()
                } else {
                    self.poll_raw_chunk()
                }
            }
        }
    }

    fn poll_string_chunk(&mut self) -> ScanResult<Step<bool>> {
        let first = self.token.stage == TokenStage::Start;
        let cursor = self.buf.cursor();
        let quote = usize::from(first);
        let interior = &self.buf.rest()[quote..];
        let limit = self.buf.capacity();
        self.decoded.clear();
        let outcome = walk_interior(interior, Some(&mut self.decoded), limit, self.buf.is_done());
        let consumed = outcome.consumed + quote;

        if !outcome.ended && outcome.consumed == 0 && !first {
            if self.buf.is_done() {
                // Source ended mid-string; what was delivered is the value.
                self.token.stage = TokenStage::End;
                return Ok(Ready(false));
            }
            return Ok(Need);
        }

        self.buf.advance(consumed);
        self.token.raw_len += consumed;
        self.token.decoded_len += outcome.chars;
        self.token.has_escapes |= outcome.has_escapes;
        self.token.stage = if outcome.ended || self.buf.at_end() {
            TokenStage::End
        } else {
            TokenStage::Interior
        };
        self.bump();
        self.chunk_start = cursor;
        self.chunk_end = cursor + consumed;
        self.chunk_serial = self.serial;
        Ok(Ready(true))
    }

    fn poll_raw_chunk(&mut self) -> ScanResult<Step<bool>> {
        let cursor = self.buf.cursor();
        let rest = self.buf.rest();
        let (len, terminated) = match self.token.kind {
            TokenKind::Number => {
                let len = rest
                    .find(|c: char| !matches!(c, '0'..='9' | '-' | '+' | '.' | 'e' | 'E'))
                    .unwrap_or(rest.len());
                for b in rest[..len].bytes() {
                    match b {
                        b'.' => self.token.has_decimal = true,
                        b'e' | b'E' => self.token.has_exponent = true,
                        _ => {}
                    }
                }
                (len, len < rest.len())
            }
            TokenKind::Whitespace => {
                let len = rest
                    .find(|c: char| !c.is_whitespace())
                    .unwrap_or(rest.len());
                (len, len < rest.len())
            }
            // Only numbers and whitespace runs stream raw.
            _ => (rest.len(), true),
        };
        if len == 0 && !terminated {
            if self.buf.is_done() {
                self.token.stage = TokenStage::End;
                return Ok(Ready(false));
            }
            return Ok(Need);
        }
        let chars = rest[..len].chars().count();
        self.decoded.clear();
        self.buf.advance(len);
        self.token.raw_len += len;
        self.token.decoded_len += chars;
        self.token.stage = if terminated || self.buf.at_end() {
            TokenStage::End
        } else {
            TokenStage::Interior
        };
        self.bump();
        self.chunk_start = cursor;
        self.chunk_end = cursor + len;
        self.chunk_serial = self.serial;
        Ok(Ready(true))
    }

    // --- chunk views -----------------------------------------------------

    pub(crate) fn text_chunk(&self) -> ScanResult<&str> {
        if self.chunk_serial != self.serial {
            return Err(crate::error::ScanError::StaleChunk);
        }
        Ok(self.buf.slice(self.chunk_start, self.chunk_end))
    }

    pub(crate) fn value_chunk(&self) -> ScanResult<&str> {
        if self.chunk_serial != self.serial {
            return Err(crate::error::ScanError::StaleChunk);
        }
        if self.token.kind == TokenKind::String {
            Ok(&self.decoded)
        } else {
            Ok(self.buf.slice(self.chunk_start, self.chunk_end))
        }
    }

    pub(crate) fn try_token_text(&self) -> Option<String> {
        if self.token.stage != TokenStage::InBuffer {
            return None;
        }
        let start = self.token.start;
        Some(self.buf.slice(start, start + self.token.raw_len).to_owned())
    }

    pub(crate) fn try_token_value(&self) -> Option<String> {
        if self.token.stage != TokenStage::InBuffer {
            return None;
        }
        let start = self.token.start;
        let end = start + self.token.raw_len;
        if self.token.kind == TokenKind::String {
            let mut out = String::with_capacity(self.token.decoded_len);
            walk_interior(self.buf.slice(start + 1, end), Some(&mut out), usize::MAX, true);
            Some(out)
        } else {
            Some(self.buf.slice(start, end).to_owned())
        }
    }

    // --- element walking -------------------------------------------------

    pub(crate) fn poll_skip_element(&mut self) -> ScanResult<Step<()>> {
        let mut depth = self.skip_depth.take().unwrap_or(0);
        loop {
            let kind = self.token.kind;
            if kind == TokenKind::None {
                return Ok(Ready(()));
            }
            match self.poll_next_token()? {
                Need => {
                    self.skip_depth = Some(depth);
                    return Ok(Need);
                }
                Ready(_) => {}
            }
            depth += kind.depth_delta();
            if depth <= 0 {
                return Ok(Ready(()));
            }
        }
    }

    pub(crate) fn poll_next_element_chunk(&mut self) -> ScanResult<Step<bool>> {
        let mut phase = match self.walk.take() {
            Some(phase) => phase,
            None => match self.token.kind {
                TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Whitespace
                | TokenKind::Error => WalkPhase::Literal,
                TokenKind::ListStart | TokenKind::ObjectStart => {
                    self.ws_tokens = true;
                    WalkPhase::Tree { depth: 0 }
                }
                _ => return Ok(Ready(false)),
            },
        };

        loop {
            match phase {
                WalkPhase::Literal => {
                    return match self.poll_next_chunk()? {
                        Need => {
                            self.walk = Some(phase);
                            Ok(Need)
                        }
                        Ready(true) => {
                            self.walk = Some(phase);
                            Ok(Ready(true))
                        }
                        Ready(false) => Ok(Ready(false)),
                    };
                }
                WalkPhase::Tree { mut depth } => {
                    let pending_start = self.buf.cursor();
                    loop {
                        // A consumed token means the next one still needs
                        // classifying (resumption lands here too).
                        if matches!(self.token.stage, TokenStage::End | TokenStage::Unread)
                            && self.token.kind != TokenKind::None
                        {
                            match self.poll_next_token()? {
                                Ready(_) => {}
                                Need => {
                                    self.walk = Some(WalkPhase::Tree { depth });
                                    if self.buf.cursor() > pending_start {
                                        self.emit_chunk(pending_start, self.buf.cursor());
                                        return Ok(Ready(true));
                                    }
                                    return Ok(Need);
                                }
                            }
                        }
                        if self.token.kind == TokenKind::None {
                            // Input ended inside the subtree.
                            self.ws_tokens = false;
                            if self.buf.cursor() > pending_start {
                                self.emit_chunk(pending_start, self.buf.cursor());
                                return Ok(Ready(true));
                            }
                            return Ok(Ready(false));
                        }
                        if self.token.stage == TokenStage::Start {
                            // Oversized token: flush what is pending, then
                            // stream the token's own chunks.
                            depth += self.token.kind.depth_delta();
                            if self.buf.cursor() > pending_start {
                                self.walk = Some(WalkPhase::TreeToken { depth });
                                self.emit_chunk(pending_start, self.buf.cursor());
                                return Ok(Ready(true));
                            }
                            phase = WalkPhase::TreeToken { depth };
                            break;
                        }
                        // In-buffer token: take its raw text whole.
                        depth += self.token.kind.depth_delta();
                        self.buf.advance(self.token.raw_len);
                        self.token.stage = TokenStage::End;
                        if depth == 0 {
                            // The matching close is consumed; this chunk
                            // finishes the element.
                            self.ws_tokens = false;
                            self.emit_chunk(pending_start, self.buf.cursor());
                            return Ok(Ready(true));
                        }
                    }
                }
                WalkPhase::TreeToken { depth } => {
                    match self.poll_next_chunk()? {
                        Need => {
                            self.walk = Some(phase);
                            return Ok(Need);
                        }
                        Ready(true) => {
                            self.walk = Some(phase);
                            return Ok(Ready(true));
                        }
                        Ready(false) => {
                            // Token exhausted; the tree walk classifies
                            // what follows.
                            phase = WalkPhase::Tree { depth };
                        }
                    }
                }
            }
        }
    }

    fn emit_chunk(&mut self, start: usize, end: usize) {
        self.bump();
        self.decoded.clear();
        self.chunk_start = start;
        self.chunk_end = end;
        self.chunk_serial = self.serial;
    }

    // --- peeking ---------------------------------------------------------

    /// Classifies the `index`-th upcoming token from buffered text alone.
    /// `None` means the answer is not yet buffered.
    pub(crate) fn scan_ahead(&self, index: usize) -> Option<TokenKind> {
        let mut at = match self.token.stage {
            TokenStage::InBuffer => self.token.start + self.token.raw_len,
            TokenStage::Unread | TokenStage::End => self.buf.cursor(),
            // A token is mid-stream; nothing past it is addressable.
            TokenStage::Start | TokenStage::Interior => return Some(TokenKind::Unknown),
        };
        let done = self.buf.is_done();
        let text = self.buf.slice(at, self.buf.len());
        at = 0;
        for counted in 0usize.. {
            let rest = &text[at..];
            let trimmed = rest.trim_start();
            at += rest.len() - trimmed.len();
            let Some(c) = trimmed.chars().next() else {
                if done {
                    return Some(TokenKind::None);
                }
                return None;
            };
            let (kind, extent) = match c {
                '[' => (TokenKind::ListStart, 1),
                ']' => (TokenKind::ListEnd, 1),
                '{' => (TokenKind::ObjectStart, 1),
                '}' => (TokenKind::ObjectEnd, 1),
                ',' => (TokenKind::Comma, 1),
                ':' => (TokenKind::Colon, 1),
                '"' => {
                    let outcome = walk_interior(&trimmed[1..], None, usize::MAX, done);
                    if !outcome.ended && !done {
                        return None;
                    }
                    (TokenKind::String, 1 + outcome.consumed)
                }
                '-' | '0'..='9' => {
                    let scan = scan_number(trimmed);
                    if !scan.terminated && !done {
                        return None;
                    }
                    (TokenKind::Number, scan.len)
                }
                'a'..='z' | 'A'..='Z' => {
                    let run = trimmed
                        .find(|ch: char| !ch.is_ascii_alphabetic())
                        .unwrap_or(trimmed.len());
                    if run == trimmed.len() && !done {
                        return None;
                    }
                    let kind = match &trimmed[..run] {
                        "true" => TokenKind::True,
                        "false" => TokenKind::False,
                        "null" => TokenKind::Null,
                        _ => TokenKind::Error,
                    };
                    (kind, run)
                }
                other => (TokenKind::Error, other.len_utf8()),
            };
            if counted == index {
                return Some(kind);
            }
            at += extent;
        }
        unreachable!()
    }
}

struct NumberScan {
    len: usize,
    has_decimal: bool,
    has_exponent: bool,
    /// A non-number character follows within the scanned text.
    terminated: bool,
}

fn scan_number(s: &str) -> NumberScan {
    let b = s.as_bytes();
    let mut i = 0;
    let mut scan = NumberScan {
        len: 0,
        has_decimal: false,
        has_exponent: false,
        terminated: false,
    };
    if b.get(i) == Some(&b'-') {
        i += 1;
    }
    while b.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if b.get(i) == Some(&b'.') {
        scan.has_decimal = true;
        i += 1;
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        scan.has_exponent = true;
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    scan.len = i;
    scan.terminated = i < b.len();
    scan
}

/// The synchronous token scanner.
pub struct TokenScanner<S> {
    core: ScanCore,
    source: S,
}

/// A scanner over a boxed, type-erased character source.
pub type DynScanner<'a> = TokenScanner<DynSource<'a>>;

impl TokenScanner<TextSource> {
    /// Scanner over in-memory text with the default configuration.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(TextSource::new(text), ScanConfig::default())
    }
}

impl<S: CharSource> TokenScanner<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            core: ScanCore::new(&config),
            source,
        }
    }

    pub fn with_defaults(source: S) -> Self {
        Self::new(source, ScanConfig::default())
    }

    fn fill(&mut self) -> ScanResult<()> {
        let free = self.core.make_room()?;
        if free == 0 {
            return Ok(());
        }
        let n = self.source.read_chars(self.core.fill_sink(), free)?;
        self.core.note_filled(n);
        Ok(())
    }

    /// Skips the rest of the current token and classifies the next one.
    /// Returns `false` at end of input.
    pub fn next_token(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_token()? {
                Ready(more) => return Ok(more),
                Need => self.fill()?,
            }
        }
    }

    /// Produces the next chunk of the current token.
    pub fn next_chunk(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_chunk()? {
                Ready(more) => return Ok(more),
                Need => self.fill()?,
            }
        }
    }

    /// Consumes the current token in full, returning its raw text, then
    /// advances to the next token.
    pub fn read_text(&mut self) -> ScanResult<String> {
        if let Some(text) = self.core.try_token_text() {
            self.next_token()?;
            return Ok(text);
        }
        let mut out = String::new();
        while self.next_chunk()? {
            out.push_str(self.core.text_chunk()?);
        }
        self.next_token()?;
        Ok(out)
    }

    /// Consumes the current token in full, returning its decoded value,
    /// then advances to the next token.
    pub fn read_value(&mut self) -> ScanResult<String> {
        if let Some(value) = self.core.try_token_value() {
            self.next_token()?;
            return Ok(value);
        }
        let mut out = String::new();
        while self.next_chunk()? {
            out.push_str(self.core.value_chunk()?);
        }
        self.next_token()?;
        Ok(out)
    }

    /// Advances past the current element, nested subtrees included.
    pub fn skip_element(&mut self) -> ScanResult<()> {
        loop {
            match self.core.poll_skip_element()? {
                Ready(()) => return Ok(()),
                Need => self.fill()?,
            }
        }
    }

    /// Produces the next raw-text chunk of the current element.
    pub fn next_element_chunk(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_element_chunk()? {
                Ready(more) => return Ok(more),
                Need => self.fill()?,
            }
        }
    }

    /// Consumes the current element, returning its exact source text, then
    /// advances to the next token.
    pub fn read_element_text(&mut self) -> ScanResult<String> {
        let mut out = String::new();
        while self.next_element_chunk()? {
            out.push_str(self.core.text_chunk()?);
        }
        self.next_token()?;
        Ok(out)
    }

    /// Classifies the `index`-th upcoming token without consuming input.
    /// Refills at most once.
    pub fn peek_kind(&mut self, index: usize) -> ScanResult<TokenKind> {
        if let Some(kind) = self.core.scan_ahead(index) {
            return Ok(kind);
        }
        self.fill()?;
        Ok(self.core.scan_ahead(index).unwrap_or(TokenKind::Unknown))
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.core.kind()
    }

    #[inline]
    pub fn stage(&self) -> TokenStage {
        self.core.stage()
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.core.position()
    }

    #[inline]
    pub fn text_chunk(&self) -> ScanResult<&str> {
        self.core.text_chunk()
    }

    #[inline]
    pub fn value_chunk(&self) -> ScanResult<&str> {
        self.core.value_chunk()
    }

    #[inline]
    pub fn try_token_text(&self) -> Option<String> {
        self.core.try_token_text()
    }

    #[inline]
    pub fn try_token_value(&self) -> Option<String> {
        self.core.try_token_value()
    }
}

impl<S: CharSource> Tokens for TokenScanner<S> {
    #[inline]
    fn next_token(&mut self) -> ScanResult<bool> {
        TokenScanner::next_token(self)
    }

    #[inline]
    fn kind(&self) -> TokenKind {
        self.core.kind()
    }

    #[inline]
    fn stage(&self) -> TokenStage {
        self.core.stage()
    }

    #[inline]
    fn position(&self) -> u64 {
        self.core.position()
    }

    #[inline]
    fn has_decimal(&self) -> bool {
        self.core.has_decimal()
    }

    #[inline]
    fn has_exponent(&self) -> bool {
        self.core.has_exponent()
    }

    #[inline]
    fn has_escapes(&self) -> bool {
        self.core.has_escapes()
    }

    #[inline]
    fn raw_len(&self) -> usize {
        self.core.raw_len()
    }

    #[inline]
    fn decoded_len(&self) -> usize {
        self.core.decoded_len()
    }

    #[inline]
    fn next_chunk(&mut self) -> ScanResult<bool> {
        TokenScanner::next_chunk(self)
    }

    #[inline]
    fn text_chunk(&self) -> ScanResult<&str> {
        self.core.text_chunk()
    }

    #[inline]
    fn value_chunk(&self) -> ScanResult<&str> {
        self.core.value_chunk()
    }

    #[inline]
    fn try_token_text(&self) -> Option<String> {
        self.core.try_token_text()
    }

    #[inline]
    fn try_token_value(&self) -> Option<String> {
        self.core.try_token_value()
    }

    #[inline]
    fn read_text(&mut self) -> ScanResult<String> {
        TokenScanner::read_text(self)
    }

    #[inline]
    fn read_value(&mut self) -> ScanResult<String> {
        TokenScanner::read_value(self)
    }

    #[inline]
    fn skip_element(&mut self) -> ScanResult<()> {
        TokenScanner::skip_element(self)
    }

    #[inline]
    fn read_element_text(&mut self) -> ScanResult<String> {
        TokenScanner::read_element_text(self)
    }

    #[inline]
    fn peek_kind(&mut self, index: usize) -> ScanResult<TokenKind> {
        TokenScanner::peek_kind(self, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn scanner_with(text: &str, capacity: usize) -> TokenScanner<TextSource> {
        TokenScanner::new(
            TextSource::new(text),
            ScanConfig::new().with_initial_capacity(capacity),
        )
    }

    /// Tokenizes the whole input into `(kind, decoded value)` pairs.
    fn tokenize(text: &str, capacity: usize) -> Vec<(TokenKind, String)> {
        let mut scanner = scanner_with(text, capacity);
        let mut out = Vec::new();
        scanner.next_token().unwrap();
        while scanner.kind() != TokenKind::None {
            let kind = scanner.kind();
            out.push((kind, scanner.read_value().unwrap()));
        }
        out
    }

    #[test]
    fn empty_input() {
        let mut scanner = scanner_with("", 4096);
        assert!(!scanner.next_token().unwrap());
        assert_eq!(scanner.kind(), TokenKind::None);
        assert_eq!(scanner.text_chunk().unwrap(), "");
        assert!(!scanner.next_token().unwrap());
    }

    #[test]
    fn classifies_all_kinds() {
        let kinds: Vec<_> = tokenize(r#"[{"a":1.5e2,"b":true},false,null]"#, 4096)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::ListStart,
                TokenKind::ObjectStart,
                TokenKind::String,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::String,
                TokenKind::Colon,
                TokenKind::True,
                TokenKind::ObjectEnd,
                TokenKind::Comma,
                TokenKind::False,
                TokenKind::Comma,
                TokenKind::Null,
                TokenKind::ListEnd,
            ]
        );
    }

    #[test_case(16)]
    #[test_case(17)]
    #[test_case(32)]
    #[test_case(64)]
    #[test_case(4096)]
    fn capacity_invariance(capacity: usize) {
        let text = r#"{ "name": "a rather long string value with \"escapes\" and é accents",
                       "nums": [1, -2.5, 3e10, 0.125],
                       "flags": [true, false, null] }"#;
        assert_eq!(tokenize(text, capacity), tokenize(text, 4096));
    }

    #[test]
    fn string_exactly_filling_buffer_is_in_buffer() {
        // 14 interior chars + 2 quotes = 16 bytes = capacity.
        let mut scanner = scanner_with(r#""12345678901234""#, 16);
        assert!(scanner.next_token().unwrap());
        assert_eq!(scanner.kind(), TokenKind::String);
        assert_eq!(scanner.stage(), TokenStage::InBuffer);
        assert_eq!(scanner.core.raw_len(), 16);
        assert_eq!(scanner.core.decoded_len(), 14);
    }

    #[test]
    fn string_exceeding_buffer_streams_in_chunks() {
        let interior = "abcdefghijklmnop"; // 16 chars; token is 18 bytes
        let text = format!("\"{interior}\"");
        let mut scanner = scanner_with(&text, 16);
        assert!(scanner.next_token().unwrap());
        assert_eq!(scanner.stage(), TokenStage::Start);

        let mut chunks = 0;
        let mut value = String::new();
        while scanner.next_chunk().unwrap() {
            chunks += 1;
            value.push_str(scanner.value_chunk().unwrap());
        }
        assert!(chunks >= 2, "expected at least two chunks, got {chunks}");
        assert_eq!(value, interior);
        assert_eq!(scanner.stage(), TokenStage::End);
    }

    #[test]
    fn chunked_value_equals_whole_read() {
        let body = "payload with \\\"escapes\\\" and \\u00e9 ".repeat(20);
        let text = format!("\"{body}\"");
        let whole = {
            let mut scanner = scanner_with(&text, 4096);
            scanner.next_token().unwrap();
            scanner.read_value().unwrap()
        };
        let mut chunked = String::new();
        let mut scanner = scanner_with(&text, 32);
        scanner.next_token().unwrap();
        while scanner.next_chunk().unwrap() {
            chunked.push_str(scanner.value_chunk().unwrap());
        }
        assert_eq!(chunked, whole);
    }

    #[test]
    fn number_ending_at_eof() {
        let mut scanner = scanner_with("-12.5e3", 4096);
        assert!(scanner.next_token().unwrap());
        assert_eq!(scanner.kind(), TokenKind::Number);
        assert_eq!(scanner.stage(), TokenStage::InBuffer);
        assert!(scanner.core.has_decimal());
        assert!(scanner.core.has_exponent());
        assert_eq!(scanner.read_value().unwrap(), "-12.5e3");
    }

    #[test]
    fn number_flags_without_markers() {
        let mut scanner = scanner_with("42 ", 4096);
        scanner.next_token().unwrap();
        assert!(!scanner.core.has_decimal());
        assert!(!scanner.core.has_exponent());
    }

    #[test]
    fn word_tokens_and_error_runs() {
        let tokens = tokenize("true false null wat", 4096);
        assert_eq!(tokens[0].0, TokenKind::True);
        assert_eq!(tokens[1].0, TokenKind::False);
        assert_eq!(tokens[2].0, TokenKind::Null);
        assert_eq!(tokens[3], (TokenKind::Error, "wat".into()));
    }

    #[test]
    fn long_error_run_grows_buffer() {
        let run = "q".repeat(64);
        let tokens = tokenize(&run, 16);
        assert_eq!(tokens, [(TokenKind::Error, run)]);
    }

    #[test]
    fn unterminated_string_at_eof_keeps_string_kind() {
        let mut scanner = scanner_with(r#""abc"#, 4096);
        assert!(scanner.next_token().unwrap());
        assert_eq!(scanner.kind(), TokenKind::String);
        assert_eq!(scanner.read_value().unwrap(), "abc");
        assert_eq!(scanner.kind(), TokenKind::None);
    }

    #[test]
    fn try_token_fast_paths() {
        let mut scanner = scanner_with(r#""ab\ncd""#, 4096);
        scanner.next_token().unwrap();
        assert_eq!(scanner.try_token_text().unwrap(), "\"ab\\ncd\"");
        assert_eq!(scanner.try_token_value().unwrap(), "ab\ncd");

        // A streamed token refuses the fast path.
        let body = "x".repeat(40);
        let text = format!("\"{body}\"");
        let mut scanner = scanner_with(&text, 16);
        scanner.next_token().unwrap();
        assert!(scanner.try_token_value().is_none());
    }

    #[test]
    fn skip_element_consumes_exactly_one_value() {
        let mut scanner = scanner_with(r#"{"a":[1,2,{"b":3}]} 42"#, 4096);
        scanner.next_token().unwrap();
        scanner.skip_element().unwrap();
        assert_eq!(scanner.kind(), TokenKind::Number);
        assert_eq!(scanner.read_value().unwrap(), "42");
        assert_eq!(scanner.kind(), TokenKind::None);
    }

    #[test]
    fn skip_element_is_not_idempotent_across_values() {
        let mut scanner = scanner_with("1 2 3", 4096);
        scanner.next_token().unwrap();
        scanner.skip_element().unwrap();
        assert_eq!(scanner.read_value().unwrap(), "2");
    }

    #[test_case(16)]
    #[test_case(4096)]
    fn element_text_is_verbatim(capacity: usize) {
        let element = r#"{ "a" : [ 1 , "two" ] ,"b":null }"#;
        let text = format!("{element} true");
        let mut scanner = scanner_with(&text, capacity);
        scanner.next_token().unwrap();
        assert_eq!(scanner.read_element_text().unwrap(), element);
        assert_eq!(scanner.kind(), TokenKind::True);
    }

    #[test]
    fn element_text_of_literal_is_raw() {
        let mut scanner = scanner_with(r#""ab\ncd" 1"#, 4096);
        scanner.next_token().unwrap();
        assert_eq!(scanner.read_element_text().unwrap(), r#""ab\ncd""#);
        assert_eq!(scanner.kind(), TokenKind::Number);
    }

    #[test]
    fn peeking_does_not_consume() {
        let mut scanner = scanner_with(r#"{"a": 1}"#, 4096);
        scanner.next_token().unwrap();
        assert_eq!(scanner.peek_kind(0).unwrap(), TokenKind::String);
        assert_eq!(scanner.peek_kind(1).unwrap(), TokenKind::Colon);
        assert_eq!(scanner.peek_kind(2).unwrap(), TokenKind::Number);
        assert_eq!(scanner.peek_kind(4).unwrap(), TokenKind::None);
        // Still positioned on the object start.
        assert_eq!(scanner.kind(), TokenKind::ObjectStart);
        assert_eq!(scanner.read_text().unwrap(), "{");
    }

    #[test]
    fn stale_chunk_views_are_rejected() {
        let mut scanner = scanner_with("1 2", 4096);
        scanner.next_token().unwrap();
        assert!(scanner.next_chunk().unwrap());
        assert_eq!(scanner.text_chunk().unwrap(), "1");
        scanner.next_token().unwrap();
        assert!(matches!(
            scanner.text_chunk(),
            Err(crate::error::ScanError::StaleChunk)
        ));
    }

    #[test]
    fn position_is_monotonic() {
        let mut scanner = scanner_with(r#"  {"k": [1, 2]}  "#, 16);
        let mut last = scanner.position();
        scanner.next_token().unwrap();
        while scanner.kind() != TokenKind::None {
            assert!(scanner.position() >= last);
            last = scanner.position();
            scanner.next_token().unwrap();
        }
    }

    #[test]
    fn unicode_whitespace_between_tokens() {
        let tokens = tokenize("1\u{2028}2\u{00a0}3", 4096);
        let values: Vec<_> = tokens.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, ["1", "2", "3"]);
    }

    #[test]
    fn boxed_sources_scan_through_the_alias() {
        let source: DynSource<'static> = Box::new(TextSource::new(r#"{"k": [1, 2]}"#));
        let mut scanner: DynScanner<'static> = TokenScanner::with_defaults(source);
        scanner.next_token().unwrap();
        assert_eq!(scanner.kind(), TokenKind::ObjectStart);
        scanner.skip_element().unwrap();
        assert_eq!(scanner.kind(), TokenKind::None);
    }

    #[test]
    fn in_buffer_token_delivers_one_chunk() {
        let mut scanner = scanner_with(r#""hi""#, 4096);
        scanner.next_token().unwrap();
        assert!(scanner.next_chunk().unwrap());
        assert_eq!(scanner.value_chunk().unwrap(), "hi");
        assert_eq!(scanner.stage(), TokenStage::End);
        assert!(!scanner.next_chunk().unwrap());
    }
}
