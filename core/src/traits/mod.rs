//! Core traits for the jsonkit streaming stack.
//!
//! The traits split along the same seams as the concrete types:
//!
//! ```text
//! CharSource / AsyncCharSource   (character supply)
//!     └── TokenScanner / AsyncTokenScanner
//!
//! Tokens / AsyncTokens           (scanner surface the binder drives)
//!     ├── FromJson / FromJsonAsync  (typed binding)
//!     └── JsonRecord / JsonRecordAsync (field-by-field record binding,
//!         shared between object reading and tabular row binding)
//!
//! ChunkSink                      (streamed string/number consumption)
//! ```
//!
//! Every synchronous trait has a suspending twin with identical semantics;
//! suspension happens only where the scanner would refill its buffer.

mod read;
mod record;
mod sink;
mod source;
mod tokens;

pub use read::{FromJson, FromJsonAsync};
pub use record::{JsonRecord, JsonRecordAsync};
pub use sink::ChunkSink;
pub use source::{AsyncCharSource, CharSource, DynSource};
pub use tokens::{AsyncTokens, Tokens};
