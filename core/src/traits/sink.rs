/// Receives a streamed token value chunk by chunk.
///
/// This is the interface the core consumes from segmented large-string
/// builders: values too big to materialize are appended span by span as
/// the scanner delivers them. `String` implements it for callers that do
/// want a contiguous result.
pub trait ChunkSink {
    /// Appends one decoded chunk.
    fn append_chunk(&mut self, chunk: &str);

    /// Characters appended so far.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChunkSink for String {
    #[inline]
    fn append_chunk(&mut self, chunk: &str) {
        self.push_str(chunk);
    }

    #[inline]
    fn len(&self) -> usize {
        self.chars().count()
    }
}
