//! Shared foundational types used across the Tessel routing-graph toolchain.
//!
//! This crate provides grid coordinates, owned multi-dimensional matrices,
//! content hashing for cache fingerprints, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod loc;
pub mod matrix;
pub mod result;

pub use hash::ContentHash;
pub use loc::GridLoc;
pub use matrix::NdMatrix;
pub use result::{InternalError, TesselResult};
