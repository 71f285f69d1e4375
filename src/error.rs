use std::num::ParseIntError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that ID allocation can emit.
///
/// Allocation has no I/O beyond sampling the clock, so the taxonomy is small:
/// the only failure modes are the clock moving backwards and, when a spin
/// budget is configured, the clock failing to advance while the per-tick
/// sequence is exhausted.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The sampled clock is behind the last recorded timestamp.
    ///
    /// The allocator refuses to generate an ID rather than risk reissuing a
    /// `(timestamp, sequence)` pair. Retry policy is left to the caller:
    /// retrying blindly could loop forever if the clock is persistently
    /// wrong.
    #[error("clock moved backwards; refusing to generate an id for {drift_ms} ms")]
    ClockRolledBack {
        /// How far behind the clock is, in milliseconds.
        drift_ms: u64,
    },

    /// The per-tick sequence was exhausted and the clock did not advance
    /// within the configured spin budget.
    ///
    /// Only reachable when a budget was set via
    /// [`IdAllocator::with_spin_budget`]; the default behavior waits
    /// indefinitely.
    ///
    /// [`IdAllocator::with_spin_budget`]: crate::IdAllocator::with_spin_budget
    #[error("sequence exhausted at tick {tick} and the clock did not advance within the spin budget")]
    SpinBudgetExhausted {
        /// The stuck tick, in milliseconds since the epoch.
        tick: u64,
    },
}

/// Errors raised while establishing the node identity at startup.
///
/// These are fatal configuration errors: an out-of-range datacenter or worker
/// id would silently corrupt adjacent bit fields if allowed through.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configured value is not a valid integer.
    #[error("`{var}` is not a valid integer")]
    Parse {
        /// The environment variable that failed to parse.
        var: &'static str,
        #[source]
        source: ParseIntError,
    },

    /// The datacenter id does not fit in its 5-bit field.
    #[error("datacenter id {0} exceeds the 5-bit maximum of 31")]
    DatacenterIdOutOfRange(u64),

    /// The worker id does not fit in its 5-bit field.
    #[error("worker id {0} exceeds the 5-bit maximum of 31")]
    WorkerIdOutOfRange(u64),
}
