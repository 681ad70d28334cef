//! Command handlers grouped by concern.

pub(crate) mod cleanup;
pub(crate) mod retrieve;
