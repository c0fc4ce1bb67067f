//! A single value kept in sync with a backing store.

use crate::codec::{CodecError, Marshaller};
use crate::persistence::{PersistenceError, PersistenceResult, TextStore};
use crate::sync::RwSafe;
use tracing::{debug, warn};

/// Owns one value of type `T`, guards it with a reader-writer lock and persists it through a
/// [`TextStore`] using the marshaller `M`.
///
/// Store I/O happens while the lock is held, so a slow store serializes with every other
/// reader and writer of the same value.
pub struct Manager<T, M> {
    value: RwSafe<T>,
    store: Option<Box<dyn TextStore>>,
    marshaller: M,
}

impl<T, M: Marshaller<T>> Manager<T, M> {
    /// Loads the value from `store`.
    ///
    /// If loading fails for any reason, `default` is kept and immediately written back so the
    /// next load succeeds. Neither failure is fatal; both are logged.
    pub fn open(store: impl TextStore + 'static, marshaller: M, default: T) -> Self {
        let manager = Self {
            value: RwSafe::new(default),
            store: Some(Box::new(store)),
            marshaller,
        };
        if let Err(err) = manager.reload() {
            warn!(
                store = %manager.describe_store(),
                error = %err,
                "could not load managed value, using the default instead"
            );
            if let Err(write_err) = manager.write() {
                warn!(
                    store = %manager.describe_store(),
                    error = %write_err,
                    "could not persist the default value"
                );
            }
        }
        manager
    }

    /// A manager without a backing store. [`reload`](Self::reload) and
    /// [`write`](Self::write) fail with [`PersistenceError::Access`].
    pub fn detached(marshaller: M, value: T) -> Self {
        Self {
            value: RwSafe::new(value),
            store: None,
            marshaller,
        }
    }

    pub fn store(&self) -> Option<&dyn TextStore> {
        self.store.as_deref()
    }

    fn describe_store(&self) -> String {
        self.store
            .as_ref()
            .map(|store| store.describe())
            .unwrap_or_else(|| "<detached>".to_string())
    }

    /// Replaces the value with the decoded contents of the store.
    ///
    /// On failure the current value is left as it was.
    pub fn reload(&self) -> PersistenceResult<()> {
        let store = match self.store.as_deref() {
            Some(store) if store.is_readable() => store,
            _ => {
                return Err(PersistenceError::Access(format!(
                    "cannot read from {}",
                    self.describe_store()
                )));
            }
        };
        // reading external storage, but mutating the managed value
        self.value.write_op(|value| {
            let text = store.read_text()?;
            *value = self.marshaller.unmarshal(&text)?;
            Ok::<_, PersistenceError>(())
        })?;
        debug!(store = %store.describe(), "reloaded managed value");
        Ok(())
    }

    /// Replaces the value with the decoded `text`, e.g. a payload from a remote service.
    pub fn reload_from_str(&self, text: &str) -> Result<(), CodecError> {
        self.value.write_op(|value| {
            *value = self.marshaller.unmarshal(text)?;
            Ok(())
        })
    }

    /// Encodes the value and overwrites the store with it.
    pub fn write(&self) -> PersistenceResult<()> {
        let store = match self.store.as_deref() {
            Some(store) if store.is_writable() => store,
            _ => {
                return Err(PersistenceError::Access(format!(
                    "cannot write to {}",
                    self.describe_store()
                )));
            }
        };
        self.value.read_op(|value| {
            let text = self.marshaller.marshal(value)?;
            store.write_text(&text)
        })?;
        debug!(store = %store.describe(), "wrote managed value");
        Ok(())
    }

    /// The encoded value, without touching the store.
    pub fn marshalled(&self) -> Result<String, CodecError> {
        self.value.read_op(|value| self.marshaller.marshal(value))
    }

    pub fn read_op<R>(&self, op: impl FnOnce(&T) -> R) -> R {
        self.value.read_op(op)
    }

    pub fn write_op<R>(&self, op: impl FnOnce(&mut T) -> R) -> R {
        self.value.write_op(op)
    }

    /// The guarded value itself. Callers take the lock they need through
    /// [`RwSafe::read_op`] / [`RwSafe::write_op`].
    pub fn managed(&self) -> &RwSafe<T> {
        &self.value
    }
}

impl<T: Clone, M: Marshaller<T>> Manager<T, M> {
    pub fn snapshot(&self) -> T {
        self.value.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FnMarshaller;
    use crate::persistence::FileStore;
    use tempfile::tempdir;

    type Counter = FnMarshaller<
        fn(&u64) -> Result<String, CodecError>,
        fn(&str) -> Result<u64, CodecError>,
    >;

    fn counter_codec() -> Counter {
        fn marshal(value: &u64) -> Result<String, CodecError> {
            Ok(value.to_string())
        }
        fn unmarshal(text: &str) -> Result<u64, CodecError> {
            text.trim()
                .parse()
                .map_err(|_| CodecError::invalid("counter", format!("'{text}' is not a number")))
        }
        FnMarshaller::new(marshal as fn(&u64) -> _, unmarshal as fn(&str) -> _)
    }

    #[test]
    fn missing_store_falls_back_and_persists_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.txt");
        let manager = Manager::open(FileStore::new(&path), counter_codec(), 42);
        assert_eq!(manager.snapshot(), 42);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42");

        // a fresh manager now loads the persisted default
        let again = Manager::open(FileStore::new(&path), counter_codec(), 0);
        assert_eq!(again.snapshot(), 42);
    }

    #[test]
    fn corrupt_store_is_overwritten_with_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.txt");
        std::fs::write(&path, "garbage").unwrap();
        let manager = Manager::open(FileStore::new(&path), counter_codec(), 3);
        assert_eq!(manager.snapshot(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3");
    }

    #[test]
    fn unwritable_store_still_constructs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("counter.txt");
        let manager = Manager::open(FileStore::new(&path), counter_codec(), 5);
        assert_eq!(manager.snapshot(), 5);
        assert!(manager.reload().unwrap_err().is_access());
        assert!(manager.write().unwrap_err().is_access());
    }

    #[test]
    fn failed_reload_keeps_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counter.txt");
        let manager = Manager::open(FileStore::new(&path), counter_codec(), 1);
        manager.write_op(|v| *v = 9);
        std::fs::write(&path, "not a number").unwrap();
        let err = manager.reload().unwrap_err();
        assert!(err.is_codec());
        assert_eq!(manager.snapshot(), 9);
    }

    #[test]
    fn detached_manager_reports_access_errors() {
        let manager = Manager::detached(counter_codec(), 1);
        assert!(manager.reload().unwrap_err().is_access());
        assert!(manager.write().unwrap_err().is_access());
        assert_eq!(manager.marshalled().unwrap(), "1");
        manager.reload_from_str("12").unwrap();
        assert_eq!(manager.snapshot(), 12);
        assert!(manager.reload_from_str("x").is_err());
        assert_eq!(manager.snapshot(), 12);
    }
}
