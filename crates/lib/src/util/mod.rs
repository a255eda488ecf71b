//! Shared utilities.
//!
//! Atomic file writes and the store lock used by the on-disk catalog and queue,
//! hashing, and test helpers.

pub mod fs;
pub mod hash;
pub mod lock;

#[cfg(test)]
pub mod testutil;
