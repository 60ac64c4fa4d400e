/*!
 * Reentrant Lock
 *
 * Explicit reentrant mutex with owner and hold-count bookkeeping.
 *
 * # Design: Explicit State Over Ambient Monitors
 *
 * The loader machinery needs three queries no std or parking_lot mutex
 * exposes directly:
 * - "does the current thread already hold this lock?" (hazard detection)
 * - "fully release the lock whatever its hold depth, then restore it"
 *   (the lockless resolution strategy)
 * - monitor-style wait/notify that releases the lock while parked
 *   (hand-off completion waits)
 *
 * So the lock is built from a `parking_lot::Mutex` around an owner +
 * hold-count record, with two condvars: one for threads waiting to acquire,
 * one serving as the lock's monitor condition.
 */

use parking_lot::{Condvar, Mutex};
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

#[derive(Debug)]
struct LockState {
    owner: Option<ThreadId>,
    holds: u32,
}

/// Reentrant mutual-exclusion lock with an explicit owner record.
#[derive(Debug)]
pub struct ReentrantLock {
    state: Mutex<LockState>,
    /// Signalled whenever the lock becomes free.
    available: Condvar,
    /// The lock's monitor condition: `wait_until` parks here, `notify_all`
    /// wakes every parked waiter.
    condition: Condvar,
}

/// One hold on a [`ReentrantLock`], released on drop.
///
/// Holds nest: acquiring again on the owning thread stacks another hold
/// instead of blocking. A hold must be dropped on the thread that acquired
/// it, so the guard is deliberately not `Send`.
#[must_use = "releasing the hold immediately makes the acquisition a no-op"]
pub struct Hold<'a> {
    lock: &'a ReentrantLock,
    _not_send: PhantomData<*const ()>,
}

impl ReentrantLock {
    /// Create an unlocked instance.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState {
                owner: None,
                holds: 0,
            }),
            available: Condvar::new(),
            condition: Condvar::new(),
        }
    }

    /// Acquire one hold, blocking if another thread owns the lock.
    pub fn acquire(&self) -> Hold<'_> {
        let me = thread::current().id();
        let mut st = self.state.lock();
        if st.owner == Some(me) {
            st.holds += 1;
        } else {
            while st.owner.is_some() {
                self.available.wait(&mut st);
            }
            st.owner = Some(me);
            st.holds = 1;
        }
        Hold {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// True when the calling thread owns the lock, at any hold depth.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    /// Run `f` with the lock fully released, then restore the previous hold
    /// depth before returning.
    ///
    /// The caller must own the lock. Restoration happens on every exit path,
    /// including unwinding out of `f`, via a drop guard; the thread blocks on
    /// the way out until it reacquires ownership.
    pub fn with_fully_released<R>(&self, f: impl FnOnce() -> R) -> R {
        let saved = {
            let mut st = self.state.lock();
            debug_assert_eq!(
                st.owner,
                Some(thread::current().id()),
                "full release requires lock ownership"
            );
            let saved = st.holds;
            st.owner = None;
            st.holds = 0;
            self.available.notify_one();
            saved
        };
        let _restore = RestoreOnDrop { lock: self, holds: saved };
        f()
    }

    /// Monitor wait: fully release the lock, park until `done()` holds, then
    /// reacquire at the previous hold depth.
    ///
    /// The caller must own the lock. The predicate is re-checked after every
    /// wakeup, so spurious and broadcast wakeups are absorbed; it must not
    /// block (an atomic flag read is the intended shape).
    pub fn wait_until(&self, mut done: impl FnMut() -> bool) {
        let me = thread::current().id();
        let mut st = self.state.lock();
        debug_assert_eq!(st.owner, Some(me), "monitor wait requires lock ownership");
        let saved = st.holds;
        st.owner = None;
        st.holds = 0;
        self.available.notify_one();

        while !done() {
            self.condition.wait(&mut st);
        }

        while st.owner.is_some() {
            self.available.wait(&mut st);
        }
        st.owner = Some(me);
        st.holds = saved;
    }

    /// Wake every thread parked in [`ReentrantLock::wait_until`].
    ///
    /// The internal state mutex is taken briefly, which orders any flag
    /// writes made before this call ahead of each waiter's predicate
    /// re-check; a publisher that sets its completion flag and then
    /// broadcasts cannot lose a wakeup.
    pub fn notify_all(&self) {
        let _st = self.state.lock();
        self.condition.notify_all();
    }
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Hold<'_> {
    fn drop(&mut self) {
        let mut st = self.lock.state.lock();
        debug_assert_eq!(
            st.owner,
            Some(thread::current().id()),
            "hold dropped on a thread that does not own the lock"
        );
        st.holds -= 1;
        if st.holds == 0 {
            st.owner = None;
            self.lock.available.notify_one();
        }
    }
}

struct RestoreOnDrop<'a> {
    lock: &'a ReentrantLock,
    holds: u32,
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        let me = thread::current().id();
        let mut st = self.lock.state.lock();
        while st.owner.is_some() {
            self.lock.available.wait(&mut st);
        }
        st.owner = Some(me);
        st.holds = self.holds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn depth(lock: &ReentrantLock) -> u32 {
        lock.state.lock().holds
    }

    #[test]
    fn test_reentrant_holds_stack() {
        let lock = ReentrantLock::new();
        assert!(!lock.is_held_by_current_thread());

        let outer = lock.acquire();
        assert!(lock.is_held_by_current_thread());
        assert_eq!(depth(&lock), 1);

        {
            let _inner = lock.acquire();
            assert_eq!(depth(&lock), 2);
        }

        assert_eq!(depth(&lock), 1);
        drop(outer);
        assert!(!lock.is_held_by_current_thread());
    }

    #[test]
    fn test_cross_thread_exclusion() {
        let lock = Arc::new(ReentrantLock::new());
        let entered = Arc::new(AtomicBool::new(false));

        let hold = lock.acquire();

        let lock_clone = lock.clone();
        let entered_clone = entered.clone();
        let handle = std::thread::spawn(move || {
            let _hold = lock_clone.acquire();
            entered_clone.store(true, Ordering::SeqCst);
            assert!(lock_clone.is_held_by_current_thread());
        });

        std::thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(Ordering::SeqCst));

        drop(hold);
        handle.join().unwrap();
        assert!(entered.load(Ordering::SeqCst));
    }

    #[test]
    fn test_full_release_restores_depth() {
        let lock = Arc::new(ReentrantLock::new());
        let observed = Arc::new(AtomicU32::new(0));

        let _h1 = lock.acquire();
        let _h2 = lock.acquire();
        let _h3 = lock.acquire();
        assert_eq!(depth(&lock), 3);

        // During the release window another thread can take the lock.
        let lock_clone = lock.clone();
        let observed_clone = observed.clone();
        lock.with_fully_released(|| {
            assert!(!lock.is_held_by_current_thread());
            let handle = std::thread::spawn(move || {
                let _hold = lock_clone.acquire();
                observed_clone.store(1, Ordering::SeqCst);
            });
            handle.join().unwrap();
        });

        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert!(lock.is_held_by_current_thread());
        assert_eq!(depth(&lock), 3);
    }

    #[test]
    fn test_full_release_restores_on_unwind() {
        let lock = ReentrantLock::new();
        let _hold = lock.acquire();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            lock.with_fully_released(|| panic!("inner failure"));
        }));

        assert!(result.is_err());
        assert!(lock.is_held_by_current_thread());
        assert_eq!(depth(&lock), 1);
    }

    #[test]
    fn test_wait_until_releases_and_reacquires() {
        let lock = Arc::new(ReentrantLock::new());
        let flag = Arc::new(AtomicBool::new(false));

        let lock_clone = lock.clone();
        let flag_clone = flag.clone();
        let waiter = std::thread::spawn(move || {
            let _outer = lock_clone.acquire();
            let _inner = lock_clone.acquire();
            lock_clone.wait_until(|| flag_clone.load(Ordering::Acquire));
            assert_eq!(lock_clone.state.lock().holds, 2);
        });

        // The waiter gives the lock up while parked, so this acquire succeeds.
        std::thread::sleep(Duration::from_millis(50));
        {
            let _hold = lock.acquire();
            flag.store(true, Ordering::Release);
            lock.notify_all();
        }

        waiter.join().unwrap();
        assert!(!lock.is_held_by_current_thread());
    }

    #[test]
    fn test_notify_before_wait_is_not_lost() {
        let lock = ReentrantLock::new();
        let flag = AtomicBool::new(true);

        // Predicate already true: wait_until must return immediately.
        let _hold = lock.acquire();
        lock.wait_until(|| flag.load(Ordering::Acquire));
        assert!(lock.is_held_by_current_thread());
    }
}
