use core::fmt;

/// A packed 64-bit Snowflake-style identifier
///
/// - 1 bit reserved (always zero, so values stay positive as `i64`)
/// - 41 bits timestamp (ms since [`FLOE_EPOCH`])
/// - 5 bits data-center ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21               17 16           12 11             0
///              +--------------+----------------+------------------+---------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | data center (5)  | worker (5)    | sequence (12) |
///              +--------------+----------------+------------------+---------------+---------------+
///              |<------------------- MSB ---------- 64 bits ---------- LSB --------------------->|
/// ```
///
/// IDs compare and sort as plain unsigned integers, which orders them first
/// by creation time, then by producer identity, then by intra-millisecond
/// sequence.
///
/// [`FLOE_EPOCH`]: crate::FLOE_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FloeId {
    id: u64,
}

impl FloeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit data-center ID field. Occupies bits
    /// 17 through 21.
    pub const DATA_CENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the data-center ID to its correct position
    /// (bit 17).
    pub const DATA_CENTER_ID_SHIFT: u64 = 17;

    /// Number of bits to shift the worker ID to its correct position (bit 12).
    pub const WORKER_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub(crate) const fn from(
        timestamp: u64,
        data_center_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let data_center_id =
            (data_center_id & Self::DATA_CENTER_ID_MASK) << Self::DATA_CENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | data_center_id | worker_id | sequence,
        }
    }

    /// Constructs an ID from its components.
    ///
    /// # Example
    ///
    /// ```
    /// use floe::FloeId;
    ///
    /// let id = FloeId::from_components(1000, 2, 3, 1);
    /// assert_eq!(id.timestamp(), 1000);
    /// assert_eq!(id.data_center_id(), 2);
    /// assert_eq!(id.worker_id(), 3);
    /// assert_eq!(id.sequence(), 1);
    /// ```
    pub const fn from_components(
        timestamp: u64,
        data_center_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            data_center_id <= Self::DATA_CENTER_ID_MASK,
            "data_center_id overflow"
        );
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, data_center_id, worker_id, sequence)
    }

    /// Extracts the timestamp from the packed ID, in milliseconds since the
    /// generating clock's epoch.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the data-center ID from the packed ID.
    pub const fn data_center_id(&self) -> u64 {
        (self.id >> Self::DATA_CENTER_ID_SHIFT) & Self::DATA_CENTER_ID_MASK
    }

    /// Extracts the worker ID from the packed ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum representable timestamp value.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum representable data-center ID.
    pub const fn max_data_center_id() -> u64 {
        Self::DATA_CENTER_ID_MASK
    }

    /// Returns the maximum representable worker ID.
    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    /// Returns the maximum representable sequence value.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Converts this ID into its raw `u64` representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw `u64` into an ID.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    /// Returns true if the current sequence value can be incremented without
    /// exhausting the current millisecond's budget.
    pub(crate) const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub(crate) const fn increment_sequence(&self) -> Self {
        Self::from_components(
            self.timestamp(),
            self.data_center_id(),
            self.worker_id(),
            self.sequence() + 1,
        )
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to
    /// zero.
    pub(crate) const fn rollover_to(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.data_center_id(), self.worker_id(), 0)
    }
}

impl fmt::Display for FloeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FloeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloeId")
            .field("raw", &format_args!("{} (0x{:016x})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("data_center_id", &self.data_center_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
