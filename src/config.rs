use crate::{ConfigError, FlakeId};

/// Environment variable holding the worker id. The `workder` spelling is
/// load-bearing: it matches what existing deployments already export.
pub const WORKER_ID_ENV: &str = "snow_flake_workder_id";

/// Environment variable holding the datacenter id.
pub const DATACENTER_ID_ENV: &str = "snow_flake_center_id";

const DEFAULT_ID: &str = "1";

/// The immutable identity of one allocator node.
///
/// A `(datacenter_id, worker_id)` pair must be unique fleet-wide for generated
/// IDs to be globally unique; the allocator cannot enforce that, so assignment
/// is an external (deployment-time) responsibility.
///
/// Both fields are validated into the 5-bit range `[0, 31]` at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    datacenter_id: u64,
    worker_id: u64,
}

impl NodeId {
    /// Creates a node identity, rejecting values that do not fit their 5-bit
    /// ID fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DatacenterIdOutOfRange`] or
    /// [`ConfigError::WorkerIdOutOfRange`] if the respective value exceeds 31.
    pub fn new(datacenter_id: u64, worker_id: u64) -> Result<Self, ConfigError> {
        if datacenter_id > FlakeId::max_datacenter_id() {
            return Err(ConfigError::DatacenterIdOutOfRange(datacenter_id));
        }
        if worker_id > FlakeId::max_worker_id() {
            return Err(ConfigError::WorkerIdOutOfRange(worker_id));
        }
        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }

    /// Reads the node identity from the environment.
    ///
    /// Looks up [`DATACENTER_ID_ENV`] and [`WORKER_ID_ENV`], each defaulting
    /// to `"1"` when unset or empty.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either value is not an integer in
    /// `[0, 31]`. Treat this as fatal at process start.
    pub fn from_env() -> Result<Self, ConfigError> {
        let datacenter_id = parse_var(DATACENTER_ID_ENV)?;
        let worker_id = parse_var(WORKER_ID_ENV)?;
        Self::new(datacenter_id, worker_id)
    }

    /// The datacenter id, in `[0, 31]`.
    #[must_use]
    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// The worker id, in `[0, 31]`.
    #[must_use]
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}

fn parse_var(var: &'static str) -> Result<u64, ConfigError> {
    let value = match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_ID.to_string(),
    };
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::Parse { var, source })
}
