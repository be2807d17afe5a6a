use core::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, FloeId, Result, TimeSource};

/// A lock-based Snowflake-style ID generator safe for unbounded concurrent
/// use.
///
/// One generator is constructed per logical worker identity — a
/// `(data_center_id, worker_id)` pair assigned externally (configuration, a
/// coordination service) — and produces IDs for the process's lifetime.
/// Generators with distinct identities never collide; a single generator
/// under a non-regressing clock produces strictly increasing IDs.
///
/// The entire decision-and-update sequence of [`next_id`] runs inside one
/// critical section, so two concurrent calls can never observe or produce
/// the same `(timestamp, sequence)` pair. Cloning is cheap and shares the
/// underlying state: clones hand out IDs from the same stream.
///
/// [`next_id`]: FloeGenerator::next_id
pub struct FloeGenerator<T>
where
    T: TimeSource,
{
    state: Arc<Mutex<FloeId>>,
    time: T,
}

impl<T> Clone for FloeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            time: self.time.clone(),
        }
    }
}

impl<T> FloeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given identity.
    ///
    /// # Parameters
    ///
    /// - `data_center_id`: identifies the producing data center, `0..=31`.
    /// - `worker_id`: identifies the producing process or machine within
    ///   that data center, `0..=31`.
    /// - `time`: the [`TimeSource`] consulted on every call (e.g.
    ///   [`WallClock`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] if either identity value exceeds
    /// its 5-bit range. Accepting such a value would silently bleed bits
    /// into adjacent fields and corrupt the layout.
    ///
    /// # Example
    ///
    /// ```
    /// use floe::{FloeGenerator, WallClock};
    ///
    /// let generator = FloeGenerator::new(1, 2, WallClock::default()).expect("identity in range");
    /// let id = generator.next_id().expect("clock did not move backwards");
    /// assert_eq!(id.data_center_id(), 1);
    /// assert_eq!(id.worker_id(), 2);
    /// ```
    ///
    /// [`WallClock`]: crate::WallClock
    pub fn new(data_center_id: u64, worker_id: u64, time: T) -> Result<Self> {
        Self::from_components(0, data_center_id, worker_id, 0, time)
    }

    /// Creates a generator from explicit component values.
    ///
    /// Useful for restoring state or pinning the starting point under test;
    /// prefer [`Self::new`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] if either identity value exceeds
    /// its 5-bit range.
    pub fn from_components(
        timestamp: u64,
        data_center_id: u64,
        worker_id: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        if data_center_id > FloeId::max_data_center_id() {
            return Err(Error::InvalidIdentity {
                field: "data center ID",
                value: data_center_id,
                max: FloeId::max_data_center_id(),
            });
        }
        if worker_id > FloeId::max_worker_id() {
            return Err(Error::InvalidIdentity {
                field: "worker ID",
                value: worker_id,
                max: FloeId::max_worker_id(),
            });
        }
        let id = FloeId::from_components(timestamp, data_center_id, worker_id, sequence);
        Ok(Self {
            state: Arc::new(Mutex::new(id)),
            time,
        })
    }

    /// Generates the next ID.
    ///
    /// Each call classifies itself against the last recorded production:
    /// same millisecond increments the sequence, a newer millisecond resets
    /// it, and an older reading fails the call. When the 4096-IDs-per-
    /// millisecond budget is exhausted, the call busy-polls the clock until
    /// the millisecond advances; the critical section is held for the whole
    /// wait, so the worst case is bounded by the next millisecond boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock reads earlier than
    /// the last production. State is not mutated; the caller decides whether
    /// to retry, alert, or abort.
    ///
    /// # Example
    ///
    /// ```
    /// use floe::{FloeGenerator, WallClock};
    ///
    /// let generator = FloeGenerator::new(0, 0, WallClock::default()).expect("identity in range");
    /// let a = generator.next_id().expect("clock did not move backwards");
    /// let b = generator.next_id().expect("clock did not move backwards");
    /// assert!(a.to_raw() < b.to_raw());
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<FloeId> {
        let mut id = self.state.lock();
        let now = self.time.current_millis();
        let last = id.timestamp();

        match now.cmp(&last) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                } else {
                    let next = self.spin_until_after(last);
                    *id = id.rollover_to(next);
                }
                Ok(*id)
            }
            Ordering::Greater => {
                *id = id.rollover_to(now);
                Ok(*id)
            }
            Ordering::Less => Err(Self::cold_clock_behind(last, now)),
        }
    }

    /// Returns the data-center ID encoded into every generated ID.
    pub fn data_center_id(&self) -> u64 {
        self.state.lock().data_center_id()
    }

    /// Returns the worker ID encoded into every generated ID.
    pub fn worker_id(&self) -> u64 {
        self.state.lock().worker_id()
    }

    /// Spins until the time source reads strictly past `last`.
    ///
    /// Called with the state lock held: releasing it mid-wait could hand the
    /// same `(timestamp, sequence)` pair to another caller.
    fn spin_until_after(&self, last: u64) -> u64 {
        let mut now = self.time.current_millis();
        while now <= last {
            core::hint::spin_loop();
            now = self.time.current_millis();
        }
        now
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(last_millis: u64, observed_millis: u64) -> Error {
        Error::ClockRegression {
            last_millis,
            observed_millis,
        }
    }
}
