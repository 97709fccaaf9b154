//! Suspending scanner support.
//!
//! [`AsyncTokenScanner`] drives the same [`ScanCore`] state machine as the
//! synchronous scanner; the only difference is the fill primitive, which
//! awaits an [`AsyncCharSource`]. Every operation suspends exactly where
//! its synchronous twin would have blocked, and nowhere else.
//!
//! Asynchronous sources live here too: a tokio mpsc channel source (for
//! input that arrives in pushed chunks), an adapter over any
//! `tokio::io::AsyncRead`, and an adapter over any
//! `futures_core::Stream` of text chunks.
//!
//! [`ScanCore`]: crate::scanner
//! [`AsyncCharSource`]: crate::traits::AsyncCharSource

use crate::config::ScanConfig;
use crate::error::ScanResult;
use crate::scanner::{ScanCore, Step};
use crate::source::TextSource;
use crate::token::{TokenKind, TokenStage};
use crate::traits::{AsyncCharSource, AsyncTokens};

/// The suspending token scanner.
pub struct AsyncTokenScanner<S> {
    core: ScanCore,
    source: S,
}

impl AsyncTokenScanner<TextSource> {
    /// Suspending scanner over in-memory text (fills resolve
    /// immediately); useful for mixing bound sources into async code.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(TextSource::new(text), ScanConfig::default())
    }
}

impl<S: AsyncCharSource> AsyncTokenScanner<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            core: ScanCore::new(&config),
            source,
        }
    }

    pub fn with_defaults(source: S) -> Self {
        Self::new(source, ScanConfig::default())
    }

    async fn fill(&mut self) -> ScanResult<()> {
        let free = self.core.make_room()?;
        if free == 0 {
            return Ok(());
        }
        let n = self.source.read_chars(self.core.fill_sink(), free).await?;
        self.core.note_filled(n);
        Ok(())
    }

    /// Skips the rest of the current token and classifies the next one.
    pub async fn next_token(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_token()? {
                Step::Ready(more) => return Ok(more),
                Step::Need => self.fill().await?,
            }
        }
    }

    /// Produces the next chunk of the current token.
    pub async fn next_chunk(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_chunk()? {
                Step::Ready(more) => return Ok(more),
                Step::Need => self.fill().await?,
            }
        }
    }

    /// Consumes the current token, returning its raw text, then advances.
    pub async fn read_text(&mut self) -> ScanResult<String> {
        if let Some(text) = self.core.try_token_text() {
            self.next_token().await?;
            return Ok(text);
        }
        let mut out = String::new();
        while self.next_chunk().await? {
            out.push_str(self.core.text_chunk()?);
        }
        self.next_token().await?;
        Ok(out)
    }

    /// Consumes the current token, returning its decoded value, then
    /// advances.
    pub async fn read_value(&mut self) -> ScanResult<String> {
        if let Some(value) = self.core.try_token_value() {
            self.next_token().await?;
            return Ok(value);
        }
        let mut out = String::new();
        while self.next_chunk().await? {
            out.push_str(self.core.value_chunk()?);
        }
        self.next_token().await?;
        Ok(out)
    }

    /// Advances past the current element, nested subtrees included.
    pub async fn skip_element(&mut self) -> ScanResult<()> {
        loop {
            match self.core.poll_skip_element()? {
                Step::Ready(()) => return Ok(()),
                Step::Need => self.fill().await?,
            }
        }
    }

    /// Produces the next raw-text chunk of the current element.
    pub async fn next_element_chunk(&mut self) -> ScanResult<bool> {
        loop {
            match self.core.poll_next_element_chunk()? {
                Step::Ready(more) => return Ok(more),
                Step::Need => self.fill().await?,
            }
        }
    }

    /// Consumes the current element, returning its exact source text,
    /// then advances.
    pub async fn read_element_text(&mut self) -> ScanResult<String> {
        let mut out = String::new();
        while self.next_element_chunk().await? {
            out.push_str(self.core.text_chunk()?);
        }
        self.next_token().await?;
        Ok(out)
    }

    /// Classifies the `index`-th upcoming token without consuming input.
    pub async fn peek_kind(&mut self, index: usize) -> ScanResult<TokenKind> {
        if let Some(kind) = self.core.scan_ahead(index) {
            return Ok(kind);
        }
        self.fill().await?;
        Ok(self.core.scan_ahead(index).unwrap_or(TokenKind::Unknown))
    }
}

impl<S: AsyncCharSource> AsyncTokens for AsyncTokenScanner<S> {
    fn next_token(&mut self) -> impl Future<Output = ScanResult<bool>> {
        AsyncTokenScanner::next_token(self)
    }

    fn kind(&self) -> TokenKind {
        self.core.kind()
    }

    fn stage(&self) -> TokenStage {
        self.core.stage()
    }

    fn position(&self) -> u64 {
        self.core.position()
    }

    fn has_decimal(&self) -> bool {
        self.core.has_decimal()
    }

    fn has_exponent(&self) -> bool {
        self.core.has_exponent()
    }

    fn has_escapes(&self) -> bool {
        self.core.has_escapes()
    }

    fn raw_len(&self) -> usize {
        self.core.raw_len()
    }

    fn decoded_len(&self) -> usize {
        self.core.decoded_len()
    }

    fn next_chunk(&mut self) -> impl Future<Output = ScanResult<bool>> {
        AsyncTokenScanner::next_chunk(self)
    }

    fn text_chunk(&self) -> ScanResult<&str> {
        self.core.text_chunk()
    }

    fn value_chunk(&self) -> ScanResult<&str> {
        self.core.value_chunk()
    }

    fn try_token_text(&self) -> Option<String> {
        self.core.try_token_text()
    }

    fn try_token_value(&self) -> Option<String> {
        self.core.try_token_value()
    }

    fn read_text(&mut self) -> impl Future<Output = ScanResult<String>> {
        AsyncTokenScanner::read_text(self)
    }

    fn read_value(&mut self) -> impl Future<Output = ScanResult<String>> {
        AsyncTokenScanner::read_value(self)
    }

    fn skip_element(&mut self) -> impl Future<Output = ScanResult<()>> {
        AsyncTokenScanner::skip_element(self)
    }

    fn read_element_text(&mut self) -> impl Future<Output = ScanResult<String>> {
        AsyncTokenScanner::read_element_text(self)
    }

    fn peek_kind(&mut self, index: usize) -> impl Future<Output = ScanResult<TokenKind>> {
        AsyncTokenScanner::peek_kind(self, index)
    }
}

#[cfg(feature = "tokio")]
pub use tokio_impl::{AsyncIoSource, CancelFlag, ChannelSource};

#[cfg(feature = "tokio")]
mod tokio_impl {
    //! Tokio-backed character sources.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::io::{AsyncRead, AsyncReadExt};
    use tokio::sync::mpsc;

    use crate::error::SourceError;
    use crate::source::{floor_char_boundary, utf8_append};
    use crate::traits::AsyncCharSource;

    /// A shared flag that cancels a [`ChannelSource`].
    #[derive(Debug, Clone, Default)]
    pub struct CancelFlag(Arc<AtomicBool>);

    impl CancelFlag {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            self.0.store(true, Ordering::Release);
        }

        pub fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }

    /// A source fed by pushed text chunks over a tokio mpsc channel.
    ///
    /// Dropping the sender ends the input normally; firing the cancel
    /// flag makes the next fill fail with [`SourceError::Cancelled`],
    /// leaving the scanner at a token boundary.
    pub struct ChannelSource {
        rx: mpsc::Receiver<String>,
        pending: String,
        taken: usize,
        cancel: Option<CancelFlag>,
    }

    impl ChannelSource {
        pub fn new(rx: mpsc::Receiver<String>) -> Self {
            Self {
                rx,
                pending: String::new(),
                taken: 0,
                cancel: None,
            }
        }

        /// Attaches a cancellation flag.
        pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
            self.cancel = Some(cancel);
            self
        }
    }

    impl AsyncCharSource for ChannelSource {
        async fn read_chars(
            &mut self,
            sink: &mut String,
            max_bytes: usize,
        ) -> Result<usize, SourceError> {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                return Err(SourceError::Cancelled);
            }
            while self.taken >= self.pending.len() {
                match self.rx.recv().await {
                    Some(chunk) => {
                        self.pending = chunk;
                        self.taken = 0;
                    }
                    None => return Ok(0),
                }
                if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                    return Err(SourceError::Cancelled);
                }
            }
            let rest = &self.pending[self.taken..];
            let take = floor_char_boundary(rest, max_bytes.min(rest.len()));
            sink.push_str(&rest[..take]);
            self.taken += take;
            Ok(take)
        }
    }

    /// A source over any `tokio::io::AsyncRead`, decoding UTF-8
    /// incrementally with the same carry discipline as the synchronous
    /// `IoSource`.
    pub struct AsyncIoSource<R> {
        inner: R,
        carry: [u8; 4],
        carry_len: usize,
        scratch: Vec<u8>,
    }

    impl<R: AsyncRead + Unpin> AsyncIoSource<R> {
        pub fn new(inner: R) -> Self {
            Self {
                inner,
                carry: [0; 4],
                carry_len: 0,
                scratch: Vec::new(),
            }
        }
    }

    impl<R: AsyncRead + Unpin> AsyncCharSource for AsyncIoSource<R> {
        async fn read_chars(
            &mut self,
            sink: &mut String,
            max_bytes: usize,
        ) -> Result<usize, SourceError> {
            if max_bytes == 0 {
                return Ok(0);
            }
            let before = sink.len();
            loop {
                self.scratch.clear();
                self.scratch.extend_from_slice(&self.carry[..self.carry_len]);
                let carried = self.carry_len;
                self.carry_len = 0;
                self.scratch.resize(carried + max_bytes, 0);
                let n = self.inner.read(&mut self.scratch[carried..]).await?;
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
}

#[cfg(feature = "futures")]
pub use futures_impl::StreamSource;

#[cfg(feature = "futures")]
mod futures_impl {
    //! Runtime-agnostic source over a `futures_core::Stream` of chunks.

    use std::pin::Pin;

    use futures_core::Stream;

    use crate::error::SourceError;
    use crate::source::floor_char_boundary;
    use crate::traits::AsyncCharSource;

    /// Adapts any `Stream<Item = String>` into a character source.
    pub struct StreamSource<St> {
        inner: St,
        pending: String,
        taken: usize,
    }

    impl<St: Stream<Item = String> + Unpin> StreamSource<St> {
        pub fn new(inner: St) -> Self {
            Self {
                inner,
                pending: String::new(),
                taken: 0,
            }
        }
    }

    impl<St: Stream<Item = String> + Unpin> AsyncCharSource for StreamSource<St> {
        async fn read_chars(
            &mut self,
            sink: &mut String,
            max_bytes: usize,
        ) -> Result<usize, SourceError> {
            while self.taken >= self.pending.len() {
                let next =
                    std::future::poll_fn(|cx| Pin::new(&mut self.inner).poll_next(cx)).await;
                match next {
                    Some(chunk) => {
                        self.pending = chunk;
                        self.taken = 0;
                    }
                    None => return Ok(0),
                }
            }
            let rest = &self.pending[self.taken..];
            let take = floor_char_boundary(rest, max_bytes.min(rest.len()));
            sink.push_str(&rest[..take]);
            self.taken += take;
            Ok(take)
        }
    }
}
