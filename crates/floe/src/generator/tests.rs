use crate::{Error, FloeGenerator, FloeId, TimeSource, WallClock};
use core::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{Builder, scope};

use rand::{Rng, SeedableRng, rngs::StdRng};

struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test can move by hand.
#[derive(Clone)]
struct SharedSettableTime {
    millis: Rc<Cell<u64>>,
}

impl SharedSettableTime {
    fn at(millis: u64) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.set(millis);
    }
}

impl TimeSource for SharedSettableTime {
    fn current_millis(&self) -> u64 {
        self.millis.get()
    }
}

/// Returns `base` for the first `stall_reads` reads, then `base + 1`.
///
/// The generator's exhaustion wait spins while holding the lock, so the
/// clock must advance itself mid-call; a hand-stepped clock cannot.
struct StallThenAdvance {
    base: u64,
    stall_reads: Cell<u32>,
}

impl TimeSource for StallThenAdvance {
    fn current_millis(&self) -> u64 {
        let left = self.stall_reads.get();
        if left == 0 {
            self.base + 1
        } else {
            self.stall_reads.set(left - 1);
            self.base
        }
    }
}

#[test]
fn sequence_increments_within_same_millisecond() {
    let generator = FloeGenerator::new(0, 0, MockTime { millis: 42 }).unwrap();

    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();
    let id3 = generator.next_id().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn new_millisecond_resets_sequence() {
    let time = SharedSettableTime::at(42);
    let generator = FloeGenerator::new(1, 1, time.clone()).unwrap();

    assert_eq!(generator.next_id().unwrap().sequence(), 0);
    assert_eq!(generator.next_id().unwrap().sequence(), 1);

    time.set(43);

    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn sequence_exhaustion_waits_for_clock_advance() {
    // 4096 reads satisfy one call each at t=42; the 4097th call reads once
    // at entry, observes one more stalled read inside the wait loop, then
    // sees the advance.
    let time = StallThenAdvance {
        base: 42,
        stall_reads: Cell::new(4098),
    };
    let generator = FloeGenerator::new(1, 2, time).unwrap();

    for expected in 0..=FloeId::max_sequence() {
        let id = generator.next_id().unwrap();
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), expected);
    }

    // The budget for t=42 is spent; this call must observe the advance and
    // not reuse sequence 0 at the stale timestamp.
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn clock_regression_fails_call_and_leaves_state() {
    let time = SharedSettableTime::at(50);
    let generator = FloeGenerator::from_components(100, 3, 4, 7, time.clone()).unwrap();

    let err = generator.next_id().unwrap_err();
    assert_eq!(
        err,
        Error::ClockRegression {
            last_millis: 100,
            observed_millis: 50,
        }
    );

    // The failed call mutated nothing: once the clock catches back up, the
    // sequence continues exactly where the restored state left it.
    time.set(100);
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), 100);
    assert_eq!(id.sequence(), 8);
    assert_eq!(id.data_center_id(), 3);
    assert_eq!(id.worker_id(), 4);
}

#[test]
fn rejects_out_of_range_identities() {
    assert!(matches!(
        FloeGenerator::new(32, 0, MockTime { millis: 1 }),
        Err(Error::InvalidIdentity { value: 32, max: 31, .. })
    ));
    assert!(matches!(
        FloeGenerator::new(0, 32, MockTime { millis: 1 }),
        Err(Error::InvalidIdentity { value: 32, max: 31, .. })
    ));
    assert!(matches!(
        FloeGenerator::from_components(0, 99, 0, 0, MockTime { millis: 1 }),
        Err(Error::InvalidIdentity { .. })
    ));
}

#[test]
fn max_identities_survive_packing() {
    let generator = FloeGenerator::new(31, 31, MockTime { millis: 42 }).unwrap();
    let id = generator.next_id().unwrap();
    assert_eq!(id.data_center_id(), 31);
    assert_eq!(id.worker_id(), 31);
    assert_eq!(id.timestamp(), 42);
    assert_eq!(generator.data_center_id(), 31);
    assert_eq!(generator.worker_id(), 31);
}

#[test]
fn wall_clock_ids_strictly_increase() {
    const TOTAL_IDS: usize = 4096 * 4;

    let generator = FloeGenerator::new(1, 1, WallClock::default()).unwrap();
    let mut last = 0u64;

    for _ in 0..TOTAL_IDS {
        let id = generator.next_id().expect("well-behaved clock");
        assert!(id.to_raw() > last);
        assert_eq!(id.data_center_id(), 1);
        assert_eq!(id.worker_id(), 1);
        last = id.to_raw();
    }
}

#[test]
fn threaded_ids_are_unique() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 8192;
    const TOTAL_IDS: usize = THREADS * IDS_PER_THREAD;

    let generator = Arc::new(FloeGenerator::new(2, 3, WallClock::default()).unwrap());
    let seen_ids = Arc::new(Mutex::new(HashSet::with_capacity(TOTAL_IDS)));

    scope(|s| {
        for _ in 0..THREADS {
            let generator = Arc::clone(&generator);
            let seen_ids = Arc::clone(&seen_ids);

            s.spawn(move || {
                for _ in 0..IDS_PER_THREAD {
                    let id = generator.next_id().expect("well-behaved clock");
                    assert!(seen_ids.lock().unwrap().insert(id.to_raw()));
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, TOTAL_IDS, "Expected {TOTAL_IDS} unique IDs");
}

const CODE_ALPHABET: &[u8] = b"1234567890ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CODE_LEN: usize = 8;

/// Derives the reference demo's 8-character alphanumeric code from an ID.
fn short_code(id: FloeId) -> String {
    let mut rng = StdRng::seed_from_u64(id.to_raw());
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[test]
fn five_thousand_concurrent_callers_yield_distinct_ids() {
    const CALLERS: usize = 5000;

    let generator = FloeGenerator::new(5, 5, WallClock::default()).unwrap();
    let (tx, rx) = mpsc::channel();

    scope(|s| {
        for _ in 0..CALLERS {
            let generator = &generator;
            let tx = tx.clone();
            Builder::new()
                .stack_size(64 * 1024)
                .spawn_scoped(s, move || {
                    let id = generator.next_id().expect("well-behaved clock");
                    tx.send(id).expect("collector alive");
                })
                .expect("spawn caller");
        }
    });
    drop(tx);

    let ids: Vec<FloeId> = rx.iter().collect();
    assert_eq!(ids.len(), CALLERS);

    let unique_ids: HashSet<u64> = ids.iter().map(|id| id.to_raw()).collect();
    assert_eq!(unique_ids.len(), CALLERS);

    // Distinct IDs must also yield distinct derived codes.
    let codes: HashSet<String> = ids.iter().map(|id| short_code(*id)).collect();
    assert_eq!(codes.len(), CALLERS);
}
