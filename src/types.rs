//! Core types shared across the ztree store and deletion layers.

/// Version: per-node data version, starts at 0 and grows on every data mutation
pub type Version = u64;

/// Millis: wall-clock timestamp in milliseconds since the Unix epoch
pub type Millis = i64;

/// Width of the counter suffix appended to sequential node names
pub const SEQUENTIAL_SUFFIX_WIDTH: usize = 10;
