use kernel_sync::SleepLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use std::{panic, thread};

#[test]
fn holder_is_tracked_per_thread() {
    let l = Arc::new(SleepLock::new(0u32, "buffer"));
    assert!(!l.holding());
    assert!(!l.is_locked());

    let g = l.lock();
    assert!(g.holding());
    assert!(l.holding());

    // Another thread sees the lock taken, but is not the holder.
    let other = Arc::clone(&l);
    let seen = thread::spawn(move || (other.is_locked(), other.holding()))
        .join()
        .unwrap();
    assert_eq!(seen, (true, false));

    drop(g);
    assert!(!l.holding());
    assert!(!l.is_locked());
}

#[test]
fn try_lock_fails_while_held() {
    let l = SleepLock::new((), "buffer");
    let g = l.try_lock();
    assert!(g.is_some());
    assert!(l.try_lock().is_none());
    drop(g);
    assert!(l.try_lock().is_some());
}

#[test]
fn waiter_blocks_until_release() {
    let l = Arc::new(SleepLock::new(Vec::<u32>::new(), "buffer"));
    let acquired = Arc::new(AtomicBool::new(false));

    let mut g = l.lock();
    g.push(1);

    let waiter = {
        let l = Arc::clone(&l);
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            let mut g = l.lock();
            acquired.store(true, Ordering::SeqCst);
            g.push(2);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(
        !acquired.load(Ordering::SeqCst),
        "waiter got in while the lock was held"
    );
    drop(g);

    waiter.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
    assert_eq!(*l.lock(), vec![1, 2]);
}

#[test]
fn contended_holders_are_exclusive() {
    let threads = 8;
    let iters = 500;

    let lock = Arc::new(SleepLock::new(0usize, "counter"));
    let in_cs = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let in_cs = Arc::clone(&in_cs);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..iters {
                    let mut g = lock.lock();
                    assert_eq!(in_cs.fetch_add(1, Ordering::SeqCst), 0);
                    *g += 1;
                    // Holders may block while holding a sleep lock.
                    thread::yield_now();
                    in_cs.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*lock.lock(), threads * iters);
}

#[test]
fn lock_is_released_on_panic() {
    let l = SleepLock::new(0u32, "buffer");
    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let mut g = l.lock();
        *g = 7;
        panic!("boom");
    }));
    assert!(res.is_err());
    assert!(!l.is_locked());
    assert_eq!(*l.lock(), 7);
}
