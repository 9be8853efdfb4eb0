//! Frame compositing: tiles and the per-node framebuffer that collects them.

pub mod framebuffer;
pub mod tile;
