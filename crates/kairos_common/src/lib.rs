//! Shared foundational types used across the Kairos timing toolchain.
//!
//! This crate provides the consistency-check result type that Kairos crates
//! use to report broken internal invariants (bugs) as opposed to user errors.

#![warn(missing_docs)]

pub mod result;

pub use result::{InternalError, Invariant, KairosResult};
