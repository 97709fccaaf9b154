#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Streaming JSON core: a pull tokenizer with bounded-memory chunked
//! delivery, a typed value binder, and a tabular row reader.
//!
//! # Layers
//!
//! - [`TokenScanner`] / [`AsyncTokenScanner`]: incremental token
//!   classification over a sliding character buffer. Oversized tokens
//!   (typically long strings) are delivered in buffer-sized chunks rather
//!   than materialized.
//! - [`FromJson`] / [`FromJsonAsync`]: typed binding of elements into
//!   primitives, containers, [`Value`] trees, [`Datum`] cells, and derived
//!   record types, with a process-wide [`read::registry`] of type-erased
//!   readers.
//! - [`TableReader`] / [`AsyncTableReader`]: row-by-row iteration of
//!   `{name, columns, rows}` table documents.
//!
//! The core is tolerant by design: stray commas are skipped, unknown
//! object members are discarded, and unparseable scalars bind to default
//! values instead of failing the stream.

pub mod async_stream;
mod buffer;
pub mod config;
mod datum;
mod decode;
mod error;
pub mod read;
mod scanner;
mod source;
pub mod tabular;
mod token;
pub mod traits;
mod value;

pub use async_stream::AsyncTokenScanner;
pub use config::ScanConfig;
pub use datum::{ColumnType, Datum};
pub use error::{ScanError, ScanResult, SourceError};
pub use read::{from_json_reader, from_json_text};
pub use scanner::{DynScanner, TokenScanner};
pub use source::{IoSource, TextSource};
pub use tabular::{AsyncTableReader, ColumnDef, TableReader};
pub use token::{TokenKind, TokenStage};
pub use traits::{
    AsyncCharSource, AsyncTokens, CharSource, ChunkSink, DynSource, FromJson, FromJsonAsync,
    JsonRecord, JsonRecordAsync, Tokens,
};
pub use value::Value;
