//! The sliding character buffer the scanner works over.
//!
//! A `CharBuffer` holds a window of the input in a `String`. The scanner
//! reads at a byte `cursor`; consumed bytes ahead of the cursor are
//! reclaimed by compaction at the next fill. The absolute position
//! (`start_pos + cursor`) is monotonic across compaction and growth.

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};

/// Sentinel returned by [`CharBuffer::peek`] outside the valid range.
pub(crate) const NUL: char = '\0';

#[derive(Debug)]
pub(crate) struct CharBuffer {
    data: String,
    /// Byte offset of the read position within `data`.
    cursor: usize,
    /// Absolute position of `data[0]` within the overall input.
    start_pos: u64,
    /// Logical capacity; `data.len()` never exceeds it.
    capacity: usize,
    max_capacity: usize,
    /// Latched once the source reports end of input.
    done: bool,
}

impl CharBuffer {
    pub(crate) fn new(config: &ScanConfig) -> Self {
        let capacity = config.effective_initial();
        Self {
            data: String::with_capacity(capacity),
            cursor: 0,
            start_pos: 0,
            capacity,
            max_capacity: config.effective_max(),
            done: false,
        }
    }

    /// Absolute position of the read cursor. Monotonic.
    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.start_pos + self.cursor as u64
    }

    #[inline]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    #[inline]
    pub(crate) fn mark_done(&mut self) {
        self.done = true;
    }

    /// True when every buffered byte has been consumed and the source is
    /// exhausted.
    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.done && self.cursor >= self.data.len()
    }

    /// Remaining text from the cursor to the end of the buffered window.
    #[inline]
    pub(crate) fn rest(&self) -> &str {
        &self.data[self.cursor..]
    }

    /// Text of the byte range `[from, to)` within the buffer.
    #[inline]
    pub(crate) fn slice(&self, from: usize, to: usize) -> &str {
        &self.data[from..to]
    }

    /// Character at `offset` bytes past the cursor, or [`NUL`] when the
    /// offset is outside the buffered window.
    #[inline]
    pub(crate) fn peek(&self, offset: usize) -> char {
        self.data[self.cursor..]
            .get(offset..)
            .and_then(|s| s.chars().next())
            .unwrap_or(NUL)
    }

    /// Moves the cursor forward by `n` bytes, clamped to the buffered end.
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.data.len());
    }

    /// Compacts consumed bytes out of the window, optionally growing, and
    /// returns `(shift, free)`: how far buffered bytes moved down and how
    /// many bytes of free tail are available for the next read.
    ///
    /// `keep_from` is the lowest byte offset that must survive compaction
    /// (the current token's start, when its text is still referenced).
    /// At most one compaction happens per call.
    pub(crate) fn make_room(&mut self, keep_from: usize, grow: bool) -> ScanResult<(usize, usize)> {
        let keep = keep_from.min(self.cursor);
        let mut shift = 0;
        if keep > 0 {
            self.data.drain(..keep);
            self.start_pos += keep as u64;
            self.cursor -= keep;
            shift = keep;
        }
        if self.data.len() == self.capacity && grow {
            if self.capacity == self.max_capacity {
                return Err(ScanError::BufferLimit {
                    max: self.max_capacity,
                });
            }
            let doubled = self.capacity.saturating_mul(2).min(self.max_capacity);
            #[cfg(feature = "tracing")]
            tracing::debug!(from = self.capacity, to = doubled, "growing scan buffer");
            self.data.reserve(doubled - self.data.len());
            self.capacity = doubled;
        }
        Ok((shift, self.capacity - self.data.len()))
    }

    /// Mutable access to the backing string for a source to append into.
    ///
    /// Callers must not remove or reorder existing bytes.
    #[inline]
    pub(crate) fn sink(&mut self) -> &mut String {
        &mut self.data
    }

    #[cfg(test)]
    pub(crate) fn push_text(&mut self, text: &str) {
        self.data.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(capacity: usize) -> CharBuffer {
        CharBuffer::new(&ScanConfig::new().with_initial_capacity(capacity))
    }

    #[test]
    fn peek_and_advance() {
        let mut buf = buffer(16);
        buf.push_text("abc");
        assert_eq!(buf.peek(0), 'a');
        assert_eq!(buf.peek(2), 'c');
        assert_eq!(buf.peek(3), NUL);
        buf.advance(2);
        assert_eq!(buf.peek(0), 'c');
        buf.advance(10);
        assert_eq!(buf.cursor(), 3);
        assert_eq!(buf.peek(0), NUL);
    }

    #[test]
    fn compaction_preserves_position() {
        let mut buf = buffer(16);
        buf.push_text("0123456789abcdef");
        buf.advance(10);
        let pos = buf.position();
        let (shift, free) = buf.make_room(10, false).unwrap();
        assert_eq!(shift, 10);
        assert_eq!(free, 10);
        assert_eq!(buf.position(), pos);
        assert_eq!(buf.rest(), "abcdef");
    }

    #[test]
    fn keep_from_limits_compaction() {
        let mut buf = buffer(16);
        buf.push_text("0123456789abcdef");
        buf.advance(10);
        // A token starting at 4 is still referenced; bytes 4.. must survive.
        let (shift, free) = buf.make_room(4, false).unwrap();
        assert_eq!(shift, 4);
        assert_eq!(free, 4);
        assert_eq!(buf.slice(0, 6), "456789");
    }

    #[test]
    fn growth_doubles_up_to_ceiling() {
        let mut buf = CharBuffer::new(
            &ScanConfig::new().with_initial_capacity(16).with_max_capacity(32),
        );
        buf.push_text("0123456789abcdef");
        let (_, free) = buf.make_room(0, true).unwrap();
        assert_eq!(buf.capacity(), 32);
        assert_eq!(free, 16);
        buf.push_text("0123456789abcdef");
        assert!(matches!(
            buf.make_room(0, true),
            Err(ScanError::BufferLimit { max: 32 })
        ));
    }

    #[test]
    fn done_latches() {
        let mut buf = buffer(16);
        assert!(!buf.at_end());
        buf.mark_done();
        assert!(buf.at_end());
        buf.push_text("x");
        assert!(!buf.at_end());
        buf.advance(1);
        assert!(buf.at_end());
    }
}
