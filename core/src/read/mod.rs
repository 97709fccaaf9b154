//! The typed value binder.
//!
//! Standard [`FromJson`] implementations live here, together with the
//! helpers they are built from, the [`Switch`] combinator, streamed reads
//! into [`ChunkSink`]s, the process-wide reader [`registry`], and the
//! generic record/row walks that `#[derive(FromJson)]` plugs into.
//!
//! [`FromJson`]: crate::traits::FromJson
//! [`Switch`]: switch::Switch
//! [`ChunkSink`]: crate::traits::ChunkSink

mod containers;
mod primitives;
pub mod record;
pub mod registry;
mod stream;
mod switch;

pub use record::{read_record, read_record_async};
pub use stream::{read_into_sink, read_into_sink_async};
pub use switch::Switch;

use crate::config::ScanConfig;
use crate::error::ScanResult;
use crate::scanner::TokenScanner;
use crate::source::{IoSource, TextSource};
use crate::token::TokenKind;
use crate::traits::{AsyncTokens, FromJson, Tokens};

/// Binds a complete JSON document held in memory.
pub fn from_json_text<T: FromJson>(text: &str) -> ScanResult<T> {
    let mut scanner = TokenScanner::new(TextSource::new(text), ScanConfig::default());
    scanner.next_token()?;
    T::from_json(&mut scanner)
}

/// Binds a complete JSON document from any [`std::io::Read`].
pub fn from_json_reader<T: FromJson>(reader: impl std::io::Read) -> ScanResult<T> {
    let mut scanner = TokenScanner::new(IoSource::new(reader), ScanConfig::default());
    scanner.next_token()?;
    T::from_json(&mut scanner)
}

/// Skips the current element and yields the target's default value.
///
/// The standard shape-mismatch branch of every permissive reader.
pub fn skip_and_default<T: Default>(tokens: &mut dyn Tokens) -> ScanResult<T> {
    tokens.skip_element()?;
    Ok(T::default())
}

/// Consumes a scalar token (string, number, `true`, `false`) as text.
///
/// `None` for anything else: `null` is consumed, other shapes are skipped
/// whole. This is the shared front half of the scalar readers.
pub fn scalar_text(tokens: &mut dyn Tokens) -> ScanResult<Option<String>> {
    match tokens.kind() {
        TokenKind::String | TokenKind::Number => Ok(Some(tokens.read_value()?)),
        TokenKind::True | TokenKind::False => Ok(Some(tokens.read_text()?)),
        TokenKind::Null => {
            tokens.next_token()?;
            Ok(None)
        }
        _ => {
            tokens.skip_element()?;
            Ok(None)
        }
    }
}

/// The suspending twin of [`scalar_text`].
pub async fn scalar_text_async<A: AsyncTokens>(tokens: &mut A) -> ScanResult<Option<String>> {
    match tokens.kind() {
        TokenKind::String | TokenKind::Number => Ok(Some(tokens.read_value().await?)),
        TokenKind::True | TokenKind::False => Ok(Some(tokens.read_text().await?)),
        TokenKind::Null => {
            tokens.next_token().await?;
            Ok(None)
        }
        _ => {
            tokens.skip_element().await?;
            Ok(None)
        }
    }
}

/// Implements `FromJson`/`FromJsonAsync` for a type via its `FromStr`
/// implementation, binding from string and number tokens and defaulting on
/// parse failure.
#[macro_export]
macro_rules! from_json_via_parse {
    ($ty:ty) => {
        impl $crate::FromJson for $ty {
            fn from_json(
                tokens: &mut dyn $crate::Tokens,
            ) -> $crate::ScanResult<Self> {
                Ok($crate::read::scalar_text(tokens)?
                    .and_then(|text| text.trim().parse().ok())
                    .unwrap_or_default())
            }
        }

        impl $crate::FromJsonAsync for $ty {
            async fn from_json_async<A: $crate::AsyncTokens>(
                tokens: &mut A,
            ) -> $crate::ScanResult<Self> {
                Ok($crate::read::scalar_text_async(tokens)
                    .await?
                    .and_then(|text| text.trim().parse().ok())
                    .unwrap_or_default())
            }
        }
    };
}
