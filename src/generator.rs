use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Error, FlakeId, NodeId, Result, TimeSource, WallClock};

/// Mutable generation state, shared by every handle to one allocator.
///
/// `last_tick` is `None` until the first successful allocation.
struct State {
    last_tick: Option<u64>,
    sequence: u64,
}

/// A lock-based Snowflake-style ID allocator suitable for multi-threaded
/// environments.
///
/// The allocator owns an immutable [`NodeId`] and wraps its generation state
/// in an [`Arc<Mutex<_>>`], allowing safe shared use across threads. Cloning
/// the allocator produces another handle to the *same* state, preserving
/// single-instance-per-process semantics without a hidden global.
///
/// Every call to [`next_id`] runs as one critical section: sample the clock,
/// check for rollback, advance the sequence, commit. Callers in the same
/// millisecond serialize on the lock; when the 12-bit sequence is exhausted
/// the caller holding the lock spins until the clock advances, so later
/// callers queue rather than interleave.
///
/// # Example
///
/// ```
/// use lekid::{IdAllocator, NodeId, WallClock};
///
/// let allocator = IdAllocator::new(NodeId::new(1, 1)?, WallClock::default());
///
/// let a = allocator.next_id()?;
/// let b = allocator.next_id()?;
/// assert!(a < b);
/// assert_eq!(a.datacenter_id(), 1);
/// assert_eq!(a.worker_id(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// [`next_id`]: IdAllocator::next_id
pub struct IdAllocator<T = WallClock>
where
    T: TimeSource,
{
    node: NodeId,
    state: Arc<Mutex<State>>,
    time: T,
    spin_budget: Option<u64>,
}

impl IdAllocator<WallClock> {
    /// Creates an allocator whose identity comes from the environment (see
    /// [`NodeId::from_env`]) and whose clock is a [`WallClock`] aligned to
    /// [`LEK_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configured datacenter or worker id is
    /// not an integer in `[0, 31]`. Treat this as fatal at process start.
    ///
    /// [`ConfigError`]: crate::ConfigError
    /// [`LEK_EPOCH`]: crate::LEK_EPOCH
    pub fn from_env() -> Result<Self, crate::ConfigError> {
        Ok(Self::new(NodeId::from_env()?, WallClock::default()))
    }
}

impl<T> IdAllocator<T>
where
    T: TimeSource,
{
    /// Creates a new allocator for the given node identity and time source.
    ///
    /// The sequence starts at zero and no timestamp is recorded until the
    /// first allocation.
    pub fn new(node: NodeId, time: T) -> Self {
        Self {
            node,
            state: Arc::new(Mutex::new(State {
                last_tick: None,
                sequence: 0,
            })),
            time,
            spin_budget: None,
        }
    }

    /// Bounds the busy-wait on sequence exhaustion to `spins` clock samples.
    ///
    /// By default the allocator waits indefinitely for the clock to advance,
    /// matching sub-millisecond clock granularity in practice (a handful of
    /// spins). A budget turns a pathologically frozen clock into a
    /// [`Error::SpinBudgetExhausted`] instead of an unbounded stall.
    #[must_use]
    pub fn with_spin_budget(mut self, spins: u64) -> Self {
        self.spin_budget = Some(spins);
        self
    }

    /// The identity baked into every ID this allocator produces.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Allocates the next unique, time-ordered ID.
    ///
    /// IDs from one allocator are strictly increasing as `u64` for as long as
    /// the system clock moves forward. Across allocators with distinct
    /// `(datacenter_id, worker_id)` pairs, IDs never collide.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRolledBack`] if the sampled clock is behind the last
    ///   recorded timestamp. The generation state is left untouched so that a
    ///   recovered clock resumes exactly where it left off; retry policy is
    ///   the caller's.
    /// - [`Error::SpinBudgetExhausted`] if a spin budget is configured and the
    ///   clock failed to advance while the per-millisecond sequence was
    ///   exhausted.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<FlakeId> {
        let mut state = self.state.lock();
        let mut now = self.time.current_millis();

        let sequence = match state.last_tick {
            Some(last) if now < last => return Err(Self::cold_clock_behind(now, last)),
            Some(last) if now == last => {
                let seq = (state.sequence + 1) & FlakeId::SEQUENCE_MASK;
                if seq == 0 {
                    // 4096 IDs issued this millisecond. Stall the caller until
                    // the clock ticks over; the sequence restarts at zero.
                    now = self.wait_until_next_tick(last)?;
                }
                seq
            }
            _ => 0,
        };

        // Committed only on success: a failed wait or rollback above leaves
        // `(last_tick, sequence)` exactly as before the call.
        state.last_tick = Some(now);
        state.sequence = sequence;

        Ok(FlakeId::from_components(
            now,
            self.node.datacenter_id(),
            self.node.worker_id(),
            sequence,
        ))
    }

    /// Allocates the next ID and renders it as a decimal string.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::next_id`].
    pub fn next_id_decimal_string(&self) -> Result<String> {
        Ok(self.next_id()?.to_decimal_string())
    }

    /// Allocates the next ID and renders it as an uppercase hexadecimal
    /// string.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::next_id`].
    pub fn next_id_hex_string(&self) -> Result<String> {
        Ok(self.next_id()?.to_hex_string())
    }

    /// Re-samples the clock until it advances past `last`.
    ///
    /// Called with the state lock held, so concurrent callers queue behind
    /// this wait instead of observing a half-advanced sequence.
    fn wait_until_next_tick(&self, last: u64) -> Result<u64> {
        let mut spins: u64 = 0;
        loop {
            let now = self.time.current_millis();
            if now > last {
                return Ok(now);
            }
            if let Some(budget) = self.spin_budget {
                spins += 1;
                if spins > budget {
                    return Err(Error::SpinBudgetExhausted { tick: last });
                }
            }
            core::hint::spin_loop();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        debug_assert!(last > now);
        Error::ClockRolledBack {
            drift_ms: last - now,
        }
    }
}

impl<T> Clone for IdAllocator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            state: Arc::clone(&self.state),
            time: self.time.clone(),
            spin_budget: self.spin_budget,
        }
    }
}
