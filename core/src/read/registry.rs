//! The process-wide reader registry.
//!
//! Maps target-type identity to a type-erased reader. The map stores
//! single-assignment cells: a cell is installed *before* its reader is
//! built, so code running during synthesis (including synthesis of
//! mutually referential readers) can hold a forwarding
//! [`DeferredReader`] and still terminate. Once a cell is filled, every
//! subsequent lookup observes the same reader.
//!
//! Lookups take a short read lock; no lock is ever held while a reader is
//! being built.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::ScanResult;
use crate::traits::{FromJson, Tokens};

/// A type-erased bound value.
pub type Slot = Box<dyn Any + Send>;

/// A reader bound to some target type, erased for storage.
pub trait ErasedReader: Send + Sync {
    /// Reads one element and returns the bound value.
    fn read_dyn(&self, tokens: &mut dyn Tokens) -> ScanResult<Slot>;
}

/// Recovers the typed value from a [`Slot`].
pub fn take_slot<T: 'static>(slot: Slot) -> Option<T> {
    slot.downcast::<T>().ok().map(|boxed| *boxed)
}

/// The erased form of a `FromJson` implementation.
struct TypedReader<T>(std::marker::PhantomData<fn() -> T>);

impl<T> Default for TypedReader<T> {
    fn default() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<T: FromJson + Send + 'static> ErasedReader for TypedReader<T> {
    fn read_dyn(&self, tokens: &mut dyn Tokens) -> ScanResult<Slot> {
        Ok(Box::new(T::from_json(tokens)?))
    }
}

/// The sentinel for types no reader could be produced for: skips the
/// element and yields an empty slot.
struct NullReader;

impl ErasedReader for NullReader {
    fn read_dyn(&self, tokens: &mut dyn Tokens) -> ScanResult<Slot> {
        tokens.skip_element()?;
        Ok(Box::new(()))
    }
}

/// Returns the null-reader sentinel.
pub fn null_reader() -> Arc<dyn ErasedReader> {
    static SENTINEL: OnceLock<Arc<NullReader>> = OnceLock::new();
    SENTINEL.get_or_init(|| Arc::new(NullReader)).clone()
}

/// A registry cell: present from before synthesis starts, filled exactly
/// once with the built reader.
#[derive(Default)]
struct ReaderCell {
    slot: OnceLock<Arc<dyn ErasedReader>>,
}

static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<ReaderCell>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<ReaderCell>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Fetches the cell for `id`, installing an empty one when absent.
fn cell_for(id: TypeId) -> Arc<ReaderCell> {
    if let Ok(map) = registry().read() {
        if let Some(cell) = map.get(&id) {
            return cell.clone();
        }
    }
    match registry().write() {
        Ok(mut map) => map.entry(id).or_default().clone(),
        // A poisoned registry means a builder panicked elsewhere; fall
        // back to a detached cell so this caller still makes progress.
        Err(_) => Arc::new(ReaderCell::default()),
    }
}

/// Returns the bound reader for `T`, building and installing it on first
/// request. Concurrent callers observe exactly one built reader.
pub fn reader_for<T: FromJson + Send + 'static>() -> Arc<dyn ErasedReader> {
    let cell = cell_for(TypeId::of::<T>());
    if let Some(reader) = cell.slot.get() {
        return reader.clone();
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(ty = std::any::type_name::<T>(), "binding reader");
    let built: Arc<dyn ErasedReader> = Arc::new(TypedReader::<T>::default());
    let _ = cell.slot.set(built.clone());
    cell.slot.get().cloned().unwrap_or(built)
}

/// Installs a custom reader for `T`.
///
/// Succeeds only while `T` is still unbound; returns `false` once a
/// reader (built-in or custom) has already been installed.
pub fn register<T: 'static>(reader: Arc<dyn ErasedReader>) -> bool {
    let cell = cell_for(TypeId::of::<T>());
    cell.slot.set(reader).is_ok()
}

/// A forwarding reader for a type whose real reader may not exist yet.
///
/// Holding one is always safe: each read looks the real reader up and
/// caches it on first success. Reading before any reader is installed
/// behaves like the null-reader sentinel.
pub struct DeferredReader {
    cell: Arc<ReaderCell>,
    resolved: OnceLock<Arc<dyn ErasedReader>>,
}

impl DeferredReader {
    /// A deferred handle on `T`'s registry cell.
    pub fn new<T: 'static>() -> Self {
        Self {
            cell: cell_for(TypeId::of::<T>()),
            resolved: OnceLock::new(),
        }
    }
}

impl ErasedReader for DeferredReader {
    fn read_dyn(&self, tokens: &mut dyn Tokens) -> ScanResult<Slot> {
        if let Some(reader) = self.resolved.get() {
            return reader.read_dyn(tokens);
        }
        match self.cell.slot.get() {
            Some(reader) => {
                let _ = self.resolved.set(reader.clone());
                reader.read_dyn(tokens)
            }
            None => null_reader().read_dyn(tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scanner::TokenScanner;
    use crate::source::TextSource;

    fn scan(text: &str) -> TokenScanner<TextSource> {
        let mut s = TokenScanner::new(TextSource::new(text), ScanConfig::default());
        s.next_token().unwrap();
        s
    }

    #[test]
    fn reads_through_erasure() {
        let reader = reader_for::<i64>();
        let slot = reader.read_dyn(&mut scan("41")).unwrap();
        assert_eq!(take_slot::<i64>(slot), Some(41));
    }

    #[test]
    fn repeated_lookups_share_one_reader() {
        let a = reader_for::<Vec<i32>>();
        let b = reader_for::<Vec<i32>>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_lookups_agree() {
        let readers: Vec<_> = std::thread::scope(|scope| {
            (0..8)
                .map(|_| scope.spawn(reader_for::<Vec<String>>))
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect()
        });
        for other in &readers[1..] {
            assert!(Arc::ptr_eq(&readers[0], other));
        }
    }

    #[test]
    fn deferred_forwards_once_installed() {
        struct Marker;
        let deferred = DeferredReader::new::<Marker>();

        // Nothing installed yet: behaves like the null reader.
        let slot = deferred.read_dyn(&mut scan("[1,2]")).unwrap();
        assert_eq!(take_slot::<()>(slot), Some(()));

        struct FortyTwo;
        impl ErasedReader for FortyTwo {
            fn read_dyn(&self, tokens: &mut dyn Tokens) -> ScanResult<Slot> {
                tokens.skip_element()?;
                Ok(Box::new(42i32))
            }
        }
        assert!(register::<Marker>(Arc::new(FortyTwo)));
        let slot = deferred.read_dyn(&mut scan("null")).unwrap();
        assert_eq!(take_slot::<i32>(slot), Some(42));
        // A second registration loses.
        assert!(!register::<Marker>(Arc::new(FortyTwo)));
    }

    #[test]
    fn null_reader_skips_and_yields_unit() {
        let mut scanner = scan(r#"[{"deep":[1,2]},3]"#);
        let slot = null_reader().read_dyn(&mut scanner).unwrap();
        assert_eq!(take_slot::<()>(slot), Some(()));
        // The whole element was consumed.
        assert_eq!(scanner.kind(), crate::token::TokenKind::None);
    }
}
