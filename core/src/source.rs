//! Synchronous character sources.

use std::io::Read;

use crate::error::SourceError;
use crate::traits::CharSource;

/// An in-memory text source.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    pos: usize,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }
}

impl CharSource for TextSource {
    fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() || max_bytes == 0 {
            return Ok(0);
        }
        let take = floor_char_boundary(rest, max_bytes.min(rest.len()));
        sink.push_str(&rest[..take]);
        self.pos += take;
        Ok(take)
    }
}

impl From<&str> for TextSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextSource {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// A source over any [`std::io::Read`], decoding UTF-8 incrementally.
///
/// Code points split across read calls are carried between calls; invalid
/// sequences decode to U+FFFD rather than failing, in keeping with the
/// core's tolerance elsewhere.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    carry: [u8; 4],
    carry_len: usize,
    scratch: Vec<u8>,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            carry: [0; 4],
            carry_len: 0,
            scratch: Vec::new(),
        }
    }
}

impl<R: Read> CharSource for IoSource<R> {
    fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError> {
        if max_bytes == 0 {
            return Ok(0);
        }
        let before = sink.len();
        // Ok(0) means end of input to the scanner, so keep reading until at
        // least one whole character lands or the reader is exhausted.
        loop {
            self.scratch.clear();
            self.scratch.extend_from_slice(&self.carry[..self.carry_len]);
            let carried = self.carry_len;
            self.carry_len = 0;
            self.scratch.resize(carried + max_bytes, 0);
            let n = self.inner.read(&mut self.scratch[carried..])?;
            self.scratch.truncate(carried + n);
            if self.scratch.is_empty() {
                return Ok(0);
            }
            let at_eof = n == 0;
            utf8_append(&self.scratch, sink, at_eof, &mut self.carry, &mut self.carry_len);
            if sink.len() > before || at_eof {
                return Ok(sink.len() - before);
            }
        }
    }
}

/// Appends the valid UTF-8 prefix of `bytes` to `sink`, stashing an
/// incomplete trailing sequence into `carry` unless `at_eof`, in which
/// case it is replaced with U+FFFD.
pub(crate) fn utf8_append(
    bytes: &[u8],
    sink: &mut String,
    at_eof: bool,
    carry: &mut [u8; 4],
    carry_len: &mut usize,
) {
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                sink.push_str(s);
                return;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                sink.push_str(valid_str(&rest[..valid]));
                rest = &rest[valid..];
                match err.error_len() {
                    Some(bad) => {
                        sink.push('\u{FFFD}');
                        rest = &rest[bad..];
                    }
                    None => {
                        // Incomplete sequence at the end of the input run.
                        if at_eof {
                            sink.push('\u{FFFD}');
                        } else {
                            let keep = rest.len().min(4);
                            carry[..keep].copy_from_slice(&rest[..keep]);
                            *carry_len = keep;
                        }
                        return;
                    }
                }
            }
        }
    }
}

// from_utf8 already validated this slice.
fn valid_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or_default()
}

/// Largest index `<= at` that lands on a char boundary of `s`.
pub(crate) fn floor_char_boundary(s: &str, at: usize) -> usize {
    let mut at = at.min(s.len());
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_source_respects_char_boundaries() {
        let mut source = TextSource::new("aé€");
        let mut sink = String::new();
        // 'a' is 1 byte and 'é' is 2, so a 2-byte read must stop after 'a'.
        assert_eq!(source.read_chars(&mut sink, 2).unwrap(), 1);
        assert_eq!(sink, "a");
        assert_eq!(source.read_chars(&mut sink, 2).unwrap(), 2);
        assert_eq!(sink, "aé");
        assert_eq!(source.read_chars(&mut sink, 16).unwrap(), 3);
        assert_eq!(sink, "aé€");
        assert_eq!(source.read_chars(&mut sink, 16).unwrap(), 0);
    }

    #[test]
    fn io_source_carries_split_code_points() {
        // '€' is E2 82 AC; a 1-byte reader splits it across calls.
        struct OneByte(Vec<u8>, usize);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.1 >= self.0.len() {
                    return Ok(0);
                }
                buf[0] = self.0[self.1];
                self.1 += 1;
                Ok(1)
            }
        }

        let mut source = IoSource::new(OneByte("€x".as_bytes().to_vec(), 0));
        let mut sink = String::new();
        let mut total = 0;
        loop {
            let n = source.read_chars(&mut sink, 64).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        assert_eq!(sink, "€x");
        assert_eq!(total, 4);
    }

    #[test]
    fn io_source_replaces_invalid_bytes() {
        let mut source = IoSource::new(&[0xffu8, b'a'][..]);
        let mut sink = String::new();
        while source.read_chars(&mut sink, 64).unwrap() > 0 {}
        assert_eq!(sink, "\u{FFFD}a");
    }
}
