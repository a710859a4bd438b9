//! Constants for the download module (timeouts, worker pool bounds).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes; elevation tiles and lidar tiles are large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Smallest worker pool.
pub const MIN_WORKERS: usize = 1;

/// Largest worker pool.
pub const MAX_WORKERS: usize = 64;

/// Worker pool size when none is given.
pub const DEFAULT_WORKERS: usize = 5;

/// Suffix of the temporary file a download streams into before it is renamed.
pub const PARTIAL_SUFFIX: &str = ".part";
