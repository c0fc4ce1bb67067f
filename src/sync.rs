//! Read/write coordination for values shared between threads.

use parking_lot::RwLock;

/// A value guarded by a single reader-writer lock.
///
/// Any number of [`read_op`](Self::read_op) calls may run at the same time, but a
/// [`write_op`](Self::write_op) excludes every other reader and writer for its duration.
/// The lock is released on every exit path of the operation, including unwinding.
///
/// The lock is not reentrant. An operation must not call back into `read_op` or `write_op`
/// on the same value, or it will deadlock.
#[derive(Debug, Default)]
pub struct RwSafe<T> {
    lock: RwLock<T>,
}

impl<T> RwSafe<T> {
    pub fn new(value: T) -> Self {
        Self {
            lock: RwLock::new(value),
        }
    }

    /// Runs `op` while holding the shared lock and returns its result.
    pub fn read_op<R>(&self, op: impl FnOnce(&T) -> R) -> R {
        let guard = self.lock.read();
        op(&guard)
    }

    /// Runs `op` while holding the exclusive lock and returns its result.
    pub fn write_op<R>(&self, op: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock.write();
        op(&mut guard)
    }

    /// Mutable access without locking, available only when nothing else can observe the value.
    pub fn get_mut(&mut self) -> &mut T {
        self.lock.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.lock.into_inner()
    }
}

impl<T: Clone> RwSafe<T> {
    /// Clones the guarded value under the shared lock.
    pub fn snapshot(&self) -> T {
        self.read_op(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    #[test]
    fn write_op_result_is_returned() {
        let safe = RwSafe::new(vec![1, 2]);
        let len = safe.write_op(|v| {
            v.push(3);
            v.len()
        });
        assert_eq!(len, 3);
        assert_eq!(safe.read_op(|v| v.clone()), vec![1, 2, 3]);
    }

    #[test]
    fn errors_propagate_and_release_lock() {
        let safe = RwSafe::new(0_u32);
        let result: Result<(), String> = safe.write_op(|_| Err("boom".to_string()));
        assert_eq!(result, Err("boom".to_string()));
        // lock is free again
        safe.write_op(|v| *v += 1);
        assert_eq!(safe.snapshot(), 1);
    }

    #[test]
    fn lock_is_released_after_panic() {
        let safe = RwSafe::new(0_u32);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            safe.write_op(|_| panic!("op failed"));
        }));
        assert!(outcome.is_err());
        safe.write_op(|v| *v = 7);
        assert_eq!(safe.snapshot(), 7);
    }

    #[test]
    fn concurrent_writes_are_not_lost() {
        let safe = RwSafe::new(0_u64);
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        safe.write_op(|v| *v += 1);
                    }
                });
            }
        });
        assert_eq!(safe.snapshot(), 4_000);
    }

    #[test]
    fn readers_never_observe_half_written_pairs() {
        // Writers keep both halves equal; a torn read would see them differ.
        let safe = RwSafe::new((0_u64, 0_u64));
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        safe.write_op(|pair| {
                            pair.0 += 1;
                            thread::yield_now();
                            pair.1 += 1;
                        });
                    }
                });
            }
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let (a, b) = safe.read_op(|pair| *pair);
                        assert_eq!(a, b);
                    }
                });
            }
        });
        assert_eq!(safe.snapshot(), (2_000, 2_000));
    }
}
