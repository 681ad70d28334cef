//! Default limits and locations for retrieval configuration.
//!
//! # Design
//! - Centralize fixed capacities so the expander and path builder agree on bounds.
//! - Keep defaults explicit for auditability.

/// Default capacity, in bytes, of an expanded retrieve command (terminator included).
pub const MAX_COMMAND_LEN: usize = 1024;
/// Default capacity, in bytes, of a canonical segment path (terminator included).
pub const MAX_PATH_LEN: usize = 1024;
/// Smallest capacity that still leaves room for one byte of output.
pub const MIN_CAPACITY: usize = 2;
/// Local log directory used when none is configured.
pub const LOG_DIR: &str = "pg_xlog";
