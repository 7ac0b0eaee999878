//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `encoder`: the inverse of `parser`, for fixtures and tests
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; the `stream` layer pulls bytes from a
//! source and hands complete frames to them.

pub(crate) mod common;
pub mod pms5003;
