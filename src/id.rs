use core::fmt;

/// A 64-bit Snowflake-style identifier.
///
/// The fields are packed from **most significant bit (MSB)** to **least
/// significant bit (LSB)**:
///
/// ```text
///  Bit Index:  63 62            22 21      17 16      12 11            0
///              +--+----------------+----------+----------+-------------+
///  Field:      | r| timestamp (41) | dc (5)   | worker(5)| sequence(12)|
///              +--+----------------+----------+----------+-------------+
///              |<------- MSB ------- 64 bits ------- LSB ------------->|
/// ```
///
/// - 1 reserved bit, always zero (keeps the value positive when stored in a
///   signed 64-bit column)
/// - 41 bits of milliseconds since [`LEK_EPOCH`] (~69 years of range)
/// - 5 bits of datacenter id, 5 bits of worker id
/// - 12 bits of per-millisecond sequence
///
/// [`LEK_EPOCH`]: crate::LEK_EPOCH
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FlakeId {
    id: u64,
}

const _: () = {
    // Compile-time check: total bit width _must_ equal the backing type. This
    // is to avoid aliasing surprises.
    assert!(
        FlakeId::RESERVED_BITS
            + FlakeId::TIMESTAMP_BITS
            + FlakeId::DATACENTER_ID_BITS
            + FlakeId::WORKER_ID_BITS
            + FlakeId::SEQUENCE_BITS
            == u64::BITS as u64,
        "Layout must match underlying type width"
    );
};

impl FlakeId {
    pub const RESERVED_BITS: u64 = 1;
    pub const TIMESTAMP_BITS: u64 = 41;
    pub const DATACENTER_ID_BITS: u64 = 5;
    pub const WORKER_ID_BITS: u64 = 5;
    pub const SEQUENCE_BITS: u64 = 12;

    pub const SEQUENCE_SHIFT: u64 = 0;
    pub const WORKER_ID_SHIFT: u64 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;
    pub const DATACENTER_ID_SHIFT: u64 = Self::WORKER_ID_SHIFT + Self::WORKER_ID_BITS;
    pub const TIMESTAMP_SHIFT: u64 = Self::DATACENTER_ID_SHIFT + Self::DATACENTER_ID_BITS;
    pub const RESERVED_SHIFT: u64 = Self::TIMESTAMP_SHIFT + Self::TIMESTAMP_BITS;

    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const DATACENTER_ID_MASK: u64 = (1 << Self::DATACENTER_ID_BITS) - 1;
    pub const WORKER_ID_MASK: u64 = (1 << Self::WORKER_ID_BITS) - 1;
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    const fn valid_mask() -> u64 {
        (Self::TIMESTAMP_MASK << Self::TIMESTAMP_SHIFT)
            | (Self::DATACENTER_ID_MASK << Self::DATACENTER_ID_SHIFT)
            | (Self::WORKER_ID_MASK << Self::WORKER_ID_SHIFT)
            | (Self::SEQUENCE_MASK << Self::SEQUENCE_SHIFT)
    }

    /// Packs the given components into an ID.
    ///
    /// Out-of-range components are masked to their field width. Use
    /// [`Self::from_components`] for the range-checked variant.
    #[must_use]
    pub const fn from(timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> Self {
        let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let d = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let w = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let s = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self { id: t | d | w | s }
    }

    /// Packs the given components into an ID, asserting field ranges in debug
    /// builds.
    #[must_use]
    pub fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            datacenter_id <= Self::DATACENTER_ID_MASK,
            "datacenter id overflow"
        );
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, datacenter_id, worker_id, sequence)
    }

    /// Extracts the timestamp (milliseconds since [`LEK_EPOCH`]) from the
    /// packed ID.
    ///
    /// [`LEK_EPOCH`]: crate::LEK_EPOCH
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter id from the packed ID.
    #[must_use]
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker id from the packed ID.
    #[must_use]
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the per-millisecond sequence from the packed ID.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum representable timestamp value.
    #[must_use]
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum representable datacenter id.
    #[must_use]
    pub const fn max_datacenter_id() -> u64 {
        Self::DATACENTER_ID_MASK
    }

    /// Returns the maximum representable worker id.
    #[must_use]
    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    /// Returns the maximum representable sequence value.
    #[must_use]
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Converts this type into its raw integer representation.
    #[must_use]
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw integer into this type.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns `true` if the reserved bit is unset.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        (self.id & !Self::valid_mask()) == 0
    }

    /// Returns a normalized version of the ID with the reserved bit cleared,
    /// guaranteeing a valid, canonical representation.
    #[must_use]
    pub const fn into_valid(self) -> Self {
        Self::from_raw(self.id & Self::valid_mask())
    }

    /// Renders the ID as a decimal string.
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        self.id.to_string()
    }

    /// Renders the ID as an uppercase hexadecimal string (no `0x` prefix).
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        format!("{:X}", self.id)
    }
}

impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("FlakeId");
        dbg.field("id", &format_args!("{:} (0x{:x})", self.id, self.id));
        dbg.field(
            "timestamp",
            &format_args!("{:} (0x{:x})", self.timestamp(), self.timestamp()),
        );
        dbg.field("datacenter_id", &self.datacenter_id());
        dbg.field("worker_id", &self.worker_id());
        dbg.field("sequence", &self.sequence());
        dbg.finish()
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.to_raw()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FlakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.id, s)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FlakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <u64 as serde::Deserialize>::deserialize(d)?;
        let id = Self::from_raw(raw);
        if !id.is_valid() {
            return Err(serde::de::Error::custom(format!(
                "reserved bit set in flake id {raw}"
            )));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_fields_and_bounds() {
        let ts = FlakeId::max_timestamp();
        let dc = FlakeId::max_datacenter_id();
        let worker = FlakeId::max_worker_id();
        let seq = FlakeId::max_sequence();

        let id = FlakeId::from(ts, dc, worker, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.datacenter_id(), dc);
        assert_eq!(id.worker_id(), worker);
        assert_eq!(id.sequence(), seq);
        assert_eq!(FlakeId::from_components(ts, dc, worker, seq), id);
        assert!(id.is_valid());
    }

    #[test]
    fn low_bit_fields() {
        let id = FlakeId::from_components(0, 0, 0, 0);
        assert_eq!(id.to_raw(), 0);

        let id = FlakeId::from_components(1, 1, 1, 1);
        assert_eq!(id.timestamp(), 1);
        assert_eq!(id.datacenter_id(), 1);
        assert_eq!(id.worker_id(), 1);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn bit_layout_round_trip() {
        // Decompose by raw masking/shifting, independent of the accessors.
        let t = 1_234_567;
        let id = FlakeId::from_components(t, 3, 7, 42);
        let raw = id.to_raw();

        assert_eq!(raw >> 22, t);
        assert_eq!((raw >> 17) & 0x1F, 3);
        assert_eq!((raw >> 12) & 0x1F, 7);
        assert_eq!(raw & 0xFFF, 42);
        assert_eq!(raw, (t << 22) | (3 << 17) | (7 << 12) | 42);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        FlakeId::from_components(0, 0, 0, FlakeId::max_sequence() + 1);
    }

    #[test]
    fn reserved_bit_validity() {
        let id = FlakeId::from_raw(u64::MAX);
        assert!(!id.is_valid());
        let valid = id.into_valid();
        assert!(valid.is_valid());
        assert_eq!(valid.timestamp(), id.timestamp());
    }

    #[test]
    fn string_renderings() {
        let id = FlakeId::from_raw(135_168);
        assert_eq!(id.to_decimal_string(), "135168");
        assert_eq!(id.to_hex_string(), "21000");
        assert_eq!(id.to_string(), "135168");

        let parsed = u64::from_str_radix(&id.to_hex_string(), 16).expect("hex parse");
        assert_eq!(parsed, id.to_raw());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_round_trip() {
        let id = FlakeId::from_components(42, 3, 7, 9);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, id.to_raw().to_string());
        let back: FlakeId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_rejects_reserved_bit() {
        let json = u64::MAX.to_string();
        assert!(serde_json::from_str::<FlakeId>(&json).is_err());
    }
}
