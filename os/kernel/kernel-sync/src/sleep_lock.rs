use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Ownership record of a [`SleepLock`].
struct SleepState {
    locked: bool,
    /// Thread holding the lock; `None` while unlocked.
    holder: Option<ThreadId>,
}

/// Blocking mutual exclusion around a value of type `T`.
///
/// A thread that finds the lock taken is suspended on a condition variable and
/// woken when the holder releases it, so the lock may be held across slow
/// operations (disk transfers) without burning a CPU in the waiters.
///
/// The lock remembers which thread holds it. [`SleepLock::holding`] answers
/// whether the *calling* thread is the holder, which lets callers enforce the
/// "must hold the lock" discipline at runtime.
///
/// Waits are unbounded; there is no timeout or cancellation.
pub struct SleepLock<T> {
    state: Mutex<SleepState>,
    wakeup: Condvar,
    /// Name used in diagnostics.
    name: &'static str,
    inner: UnsafeCell<T>,
}

// Safety: `inner` is only reached through a guard, and at most one guard exists.
unsafe impl<T: Send> Sync for SleepLock<T> {}

impl<T> SleepLock<T> {
    pub const fn new(inner: T, name: &'static str) -> Self {
        Self {
            state: Mutex::new(SleepState {
                locked: false,
                holder: None,
            }),
            wakeup: Condvar::new(),
            name,
            inner: UnsafeCell::new(inner),
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The bookkeeping state is two plain fields that are always written
    /// together, so a panic elsewhere cannot leave it torn; poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, SleepState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the lock is free, then take it.
    pub fn lock(&self) -> SleepLockGuard<'_, T> {
        let mut state = self.state();
        while state.locked {
            state = self
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.locked = true;
        state.holder = Some(thread::current().id());
        SleepLockGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Take the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<SleepLockGuard<'_, T>> {
        let mut state = self.state();
        if state.locked {
            return None;
        }
        state.locked = true;
        state.holder = Some(thread::current().id());
        Some(SleepLockGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// Whether the calling thread holds this lock.
    pub fn holding(&self) -> bool {
        let state = self.state();
        state.locked && state.holder == Some(thread::current().id())
    }

    /// Whether any thread holds this lock.
    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    /// Mutable access when you have `&mut self` (no contention possible).
    #[inline]
    pub const fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    fn unlock(&self) {
        let mut state = self.state();
        state.locked = false;
        state.holder = None;
        drop(state);
        self.wakeup.notify_one();
    }
}

impl<T> fmt::Debug for SleepLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SleepLock")
            .field("name", &self.name)
            .field("locked", &state.locked)
            .field("holder", &state.holder)
            .finish_non_exhaustive()
    }
}

/// Proof that the current thread holds a [`SleepLock`].
///
/// The guard is tied to the acquiring thread: it is neither `Send` nor `Sync`.
pub struct SleepLockGuard<'a, T> {
    lock: &'a SleepLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> SleepLockGuard<'_, T> {
    /// Whether the lock behind this guard is held by the calling thread.
    ///
    /// Always true for a live guard; kept so lock-discipline checks read the
    /// same whether the caller has a guard or only the lock.
    #[inline]
    pub fn holding(&self) -> bool {
        self.lock.holding()
    }
}

impl<T> Deref for SleepLockGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.inner.get() }
    }
}

impl<T> DerefMut for SleepLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.inner.get() }
    }
}

impl<T> Drop for SleepLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
