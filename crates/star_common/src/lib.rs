//! Shared foundational types used across the STAR reporting tools.
//!
//! This crate provides the timing check direction ([`DelayType`]) shared by the
//! configuration, aggregation, and report crates.

#![warn(missing_docs)]

pub mod delay;

pub use delay::{DelayType, ParseDelayTypeError};
