use crate::error::SourceError;

/// A pull-style supply of characters for the scanner.
///
/// Implementations append at most `max_bytes` of whole characters to
/// `sink` and return the number of bytes appended. Returning `Ok(0)`
/// signals end of input; the scanner latches it and never calls the
/// source again.
pub trait CharSource {
    /// Appends up to `max_bytes` of input to `sink`.
    ///
    /// Must never split a character across calls and must never remove
    /// bytes already in `sink`.
    fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError>;
}

/// A boxed, type-erased character source.
pub type DynSource<'a> = Box<dyn CharSource + 'a>;

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    #[inline]
    fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError> {
        (**self).read_chars(sink, max_bytes)
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    #[inline]
    fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError> {
        (**self).read_chars(sink, max_bytes)
    }
}

/// The suspending twin of [`CharSource`].
///
/// Used by the suspending scanner flavors; the only points at which any
/// scanner operation suspends are calls into this trait.
pub trait AsyncCharSource {
    /// Appends up to `max_bytes` of input to `sink`, suspending while the
    /// underlying supply would block.
    fn read_chars(
        &mut self,
        sink: &mut String,
        max_bytes: usize,
    ) -> impl Future<Output = Result<usize, SourceError>>;
}

// Every bound source is trivially a suspending source whose fills resolve
// immediately, so sync inputs mix freely into async pipelines.
impl<S: CharSource> AsyncCharSource for S {
    async fn read_chars(&mut self, sink: &mut String, max_bytes: usize) -> Result<usize, SourceError> {
        CharSource::read_chars(self, sink, max_bytes)
    }
}
