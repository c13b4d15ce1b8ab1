use kernel_bio::{BcacheConfig, BlockId, BufferCache, CacheStats, RamDisk};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn cache(buffers: usize, buckets: usize) -> BufferCache<RamDisk> {
    BufferCache::new(RamDisk::new(), BcacheConfig::new(buffers, buckets)).unwrap()
}

fn block(blockno: u32) -> BlockId {
    BlockId::new(0, blockno)
}

fn counter(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

fn bump(data: &mut [u8]) {
    let next = counter(data) + 1;
    data[..4].copy_from_slice(&next.to_le_bytes());
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

#[test]
fn one_holder_per_buffer() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;
    let c = Arc::new(cache(4, 2));
    let inside = Arc::new(AtomicBool::new(false));
    let start = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let c = Arc::clone(&c);
            let inside = Arc::clone(&inside);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..ROUNDS {
                    let mut buf = c.read(block(5));
                    assert!(!inside.swap(true, Ordering::AcqRel), "two holders at once");
                    let seen = counter(buf.data());
                    thread::yield_now();
                    buf.data_mut()[..4].copy_from_slice(&(seen + 1).to_le_bytes());
                    inside.store(false, Ordering::Release);
                    c.release(buf);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let buf = c.read(block(5));
    assert_eq!(counter(buf.data()) as usize, THREADS * ROUNDS);
    assert_eq!(c.device().reads(), 1);
}

#[test]
fn concurrent_first_reads_share_one_buffer() {
    const THREADS: usize = 8;
    let disk = RamDisk::new().with_latency(Duration::from_millis(5));
    let c = Arc::new(BufferCache::new(disk, BcacheConfig::new(4, 2)).unwrap());
    let start = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let c = Arc::clone(&c);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                c.read(block(42)).slot()
            })
        })
        .collect();
    let slots: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(slots.iter().all(|&s| s == slots[0]), "{slots:?}");
    assert_eq!(c.device().reads(), 1);
    assert_eq!(c.stats().misses, 1);
    assert_eq!(c.stats().hits, THREADS as u64 - 1);
}

#[test]
fn pinned_block_is_shared_by_every_reader() {
    const THREADS: usize = 6;
    // One buffer for block 11 plus one per thread for the churn.
    let c = Arc::new(cache(THREADS + 2, 3));
    let buf = c.read(block(11));
    let home = buf.slot();
    let pin = c.pin(&buf);
    c.release(buf);

    let start = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let c = Arc::clone(&c);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                // Churn other blocks in between to put pressure on the pool.
                drop(c.read(block(100 + u32::try_from(i).unwrap())));
                c.read(block(11)).slot()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), home);
    }

    c.unpin(pin);
    c.audit().unwrap();
}

#[test]
fn pinned_buffer_survives_pool_turnover() {
    let c = cache(4, 2);
    let mut buf = c.read(block(100));
    let slot = buf.slot();
    // Not committed: if the buffer were recycled, a re-read would see zeros.
    buf.data_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
    let pin = c.pin(&buf);
    c.release(buf);

    for blockno in 0..20 {
        let other = c.read(block(blockno));
        assert_ne!(other.slot(), slot);
    }

    let buf = c.read(block(100));
    assert_eq!(buf.slot(), slot);
    assert_eq!(&buf.data()[..4], &[1, 2, 3, 4]);
    assert_eq!(c.device().reads(), 21);
    assert_eq!(c.device().writes(), 0);
    c.release(buf);
    c.unpin(pin);
}

#[test]
fn committed_block_round_trips_through_eviction() {
    const PATTERN: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
    let c = cache(2, 2);
    let seven = BlockId::new(0, 7);

    let mut buf = c.read(seven);
    buf.data_mut()[..4].copy_from_slice(&PATTERN);
    c.commit(&buf);
    c.release(buf);
    assert_eq!(c.device().writes(), 1);
    assert_eq!(&c.device().snapshot(seven)[..4], &PATTERN);

    for blockno in 100..104 {
        c.release(c.read(block(blockno)));
    }
    let reads = c.device().reads();

    let buf = c.read(seven);
    assert_eq!(c.device().reads(), reads + 1, "block 7 should have been evicted");
    assert_eq!(&buf.data()[..4], &PATTERN);
}

#[test]
fn released_buffer_is_recycled_first() {
    let c = cache(2, 2);

    let a = c.read(block(0));
    let b = c.read(block(2));
    let recycled = a.slot();
    assert_ne!(b.slot(), recycled);

    // Both now live in bucket 0; `a` is released last.
    c.release(b);
    c.release(a);

    let next = c.read(block(4));
    assert_eq!(next.slot(), recycled);
    c.release(next);
    assert_eq!(c.device().reads(), 3);

    // Block 2 was released earlier but is still cached.
    let again = c.read(block(2));
    assert_eq!(c.device().reads(), 3);
    c.release(again);
}

#[test]
#[should_panic(expected = "bget: no buffers")]
fn exhausted_pool_is_fatal() {
    let c = cache(2, 2);
    let _a = c.read(block(0));
    let _b = c.read(block(1));
    let _ = c.read(block(2));
}

#[test]
#[should_panic(expected = "bget: no buffers")]
fn pins_count_against_the_pool() {
    let c = cache(1, 1);
    let buf = c.read(block(0));
    let _pin = c.pin(&buf);
    c.release(buf);
    let _ = c.read(block(1));
}

#[test]
#[should_panic(expected = "bwrite")]
fn commit_through_another_cache_is_fatal() {
    let a = cache(1, 1);
    let b = cache(1, 1);
    let buf = a.read(block(0));
    b.commit(&buf);
}

#[test]
#[should_panic(expected = "brelse")]
fn release_to_another_cache_is_fatal() {
    let a = cache(1, 1);
    let b = cache(1, 1);
    let buf = a.read(block(0));
    b.release(buf);
}

#[test]
#[should_panic(expected = "bunpin")]
fn unpin_of_foreign_pin_is_fatal() {
    let a = cache(1, 1);
    let b = cache(1, 1);
    let buf = a.read(block(0));
    let pin = a.pin(&buf);
    b.unpin(pin);
}

#[test]
#[should_panic(expected = "bunpin")]
fn pin_from_an_identical_cache_is_fatal() {
    let a = cache(1, 1);
    let b = cache(1, 1);
    let in_a = a.read(block(0));
    let pin = a.pin(&in_a);

    // Same slot and block, and referenced in `b` as well.
    let in_b = b.read(block(0));
    let _held = b.pin(&in_b);
    assert_eq!((pin.slot(), pin.block()), (in_b.slot(), in_b.block()));

    b.unpin(pin);
}

#[test]
fn stats_count_hits_misses_and_foreign_recycles() {
    let c = cache(2, 2);
    let a = c.read(block(1));
    let b = c.read(block(3)); // bucket 1 is busy, takes bucket 0's buffer
    c.release(a);
    c.release(b);
    c.release(c.read(block(1)));

    assert_eq!(
        c.stats(),
        CacheStats {
            hits: 1,
            misses: 2,
            foreign_recycles: 1,
        }
    );
}

#[test]
fn audit_holds_under_concurrent_churn() {
    const THREADS: usize = 4;
    const ROUNDS: usize = 500;
    const BLOCKS: u64 = 24;
    let c = Arc::new(cache(6, 3));
    let done = Arc::new(AtomicBool::new(false));
    let audits = Arc::new(AtomicUsize::new(0));

    let auditor = {
        let c = Arc::clone(&c);
        let done = Arc::clone(&done);
        let audits = Arc::clone(&audits);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let sizes = c.audit().unwrap();
                assert_eq!(sizes.iter().sum::<usize>(), 6);
                audits.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ (t as u64 + 1));
                for _ in 0..ROUNDS {
                    let blockno = u32::try_from(rng.next() % BLOCKS).unwrap();
                    let mut buf = c.read(block(blockno));
                    bump(buf.data_mut());
                    c.commit(&buf);
                    c.release(buf);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    done.store(true, Ordering::Release);
    auditor.join().unwrap();

    let total: usize = (0..BLOCKS)
        .map(|b| {
            let buf = c.read(block(u32::try_from(b).unwrap()));
            counter(buf.data()) as usize
        })
        .sum();
    assert_eq!(total, THREADS * ROUNDS);
    assert_eq!(c.audit().map(|sizes| sizes.len()), Ok(3));
    assert!(audits.load(Ordering::Relaxed) > 0);
}
