//! Streamed consumption of oversized scalar tokens.
//!
//! Feeds a string or number value into a [`ChunkSink`] chunk by chunk, so
//! the value is never materialized whole. This is the seam segmented
//! large-string builders plug into.

use crate::error::ScanResult;
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, ChunkSink, Tokens};

/// Streams the current string or number token into `sink` and advances to
/// the next token. Other shapes are skipped without touching the sink.
pub fn read_into_sink(tokens: &mut dyn Tokens, sink: &mut dyn ChunkSink) -> ScanResult<()> {
    match tokens.kind() {
        TokenKind::String | TokenKind::Number => {
            while tokens.next_chunk()? {
                sink.append_chunk(tokens.value_chunk()?);
            }
            tokens.next_token()?;
            Ok(())
        }
        _ => tokens.skip_element(),
    }
}

/// The suspending twin of [`read_into_sink`].
pub async fn read_into_sink_async<A: AsyncTokens>(
    tokens: &mut A,
    sink: &mut (impl ChunkSink + ?Sized),
) -> ScanResult<()> {
    match tokens.kind() {
        TokenKind::String | TokenKind::Number => {
            while tokens.next_chunk().await? {
                sink.append_chunk(tokens.value_chunk()?);
            }
            tokens.next_token().await?;
            Ok(())
        }
        _ => tokens.skip_element().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scanner::TokenScanner;
    use crate::source::TextSource;

    /// A sink that only remembers lengths, like a segmented builder would.
    #[derive(Default)]
    struct Counting {
        chunks: usize,
        chars: usize,
    }

    impl ChunkSink for Counting {
        fn append_chunk(&mut self, chunk: &str) {
            self.chunks += 1;
            self.chars += chunk.chars().count();
        }

        fn len(&self) -> usize {
            self.chars
        }
    }

    #[test]
    fn streams_long_string_in_bounded_chunks() {
        let body = "x".repeat(200);
        let text = format!("\"{body}\"");
        let mut scanner = TokenScanner::new(
            TextSource::new(text),
            ScanConfig::new().with_initial_capacity(32),
        );
        scanner.next_token().unwrap();

        let mut sink = Counting::default();
        read_into_sink(&mut scanner, &mut sink).unwrap();
        assert_eq!(sink.chars, 200);
        assert!(sink.chunks > 1, "expected chunked delivery, got one chunk");
    }

    #[test]
    fn string_sink_collects_whole_value() {
        let mut scanner = TokenScanner::from_text(r#""ab\ncd""#);
        scanner.next_token().unwrap();
        let mut out = String::new();
        read_into_sink(&mut scanner, &mut out).unwrap();
        assert_eq!(out, "ab\ncd");
    }

    #[test]
    fn mismatched_shape_leaves_sink_untouched() {
        let mut scanner = TokenScanner::from_text("[1,2,3]");
        scanner.next_token().unwrap();
        let mut out = String::new();
        read_into_sink(&mut scanner, &mut out).unwrap();
        assert!(out.is_empty());
    }
}
