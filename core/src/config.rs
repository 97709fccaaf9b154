//! Scanner configuration.
//!
//! [`ScanConfig`] controls the working buffer the scanner slides over the
//! input. The buffer starts at `initial_capacity` and doubles on demand,
//! never past `max_capacity`. Growth only happens while classifying a new
//! token; chunked delivery of an oversized token refills in place.
//!
//! # Example
//!
//! ```ignore
//! use jsonkit_core::ScanConfig;
//!
//! // Defaults: 4 KiB initial buffer, unbounded growth.
//! let config = ScanConfig::default();
//!
//! // Small buffer to force chunked string delivery.
//! let config = ScanConfig::new().with_initial_capacity(64);
//!
//! // Cap memory for hostile input.
//! let config = ScanConfig::new().with_max_capacity(1 << 20);
//! ```

/// Smallest buffer the scanner will work with.
///
/// Below this the longest escape sequence (a recombined surrogate pair,
/// twelve bytes) could not be held whole, and chunk delivery could stall.
pub const MIN_CAPACITY: usize = 16;

/// Configuration for the scanner's sliding character buffer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Initial buffer capacity in bytes.
    ///
    /// Clamped up to [`MIN_CAPACITY`]. Default: 4096.
    pub initial_capacity: usize,

    /// Ceiling for buffer growth in bytes.
    ///
    /// A token whose classification needs more space than this fails with
    /// `ScanError::BufferLimit`. Default: `usize::MAX` (no ceiling).
    pub max_capacity: usize,
}

impl Default for ScanConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ScanConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        initial_capacity: 4096,
        max_capacity: usize::MAX,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the initial buffer capacity.
    #[inline]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the growth ceiling.
    #[inline]
    pub const fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Initial capacity with the floor applied.
    #[inline]
    pub(crate) const fn effective_initial(&self) -> usize {
        if self.initial_capacity < MIN_CAPACITY {
            MIN_CAPACITY
        } else {
            self.initial_capacity
        }
    }

    /// Growth ceiling with the floor applied.
    #[inline]
    pub(crate) const fn effective_max(&self) -> usize {
        let initial = self.effective_initial();
        if self.max_capacity < initial {
            initial
        } else {
            self.max_capacity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.max_capacity, usize::MAX);
    }

    #[test]
    fn builder() {
        let config = ScanConfig::new()
            .with_initial_capacity(64)
            .with_max_capacity(1024);
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_capacity, 1024);
    }

    #[test]
    fn clamps_tiny_capacities() {
        let config = ScanConfig::new().with_initial_capacity(2).with_max_capacity(4);
        assert_eq!(config.effective_initial(), MIN_CAPACITY);
        assert_eq!(config.effective_max(), MIN_CAPACITY);
    }
}
