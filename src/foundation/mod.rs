//! Shared vocabulary: vectors, pixel formats, handles, errors and wire primitives.

pub mod core;
pub mod error;
pub mod wire;
