//! Wall geometry: which display node owns which pixels and tiles.

/// Configuration file, broadcast form and environment settings.
pub mod config;
/// Rank resolution and the tile routing table.
pub mod geometry;
