//! Process roles around the wall: the master, the display nodes and the farm endpoint.

/// In-process display cluster and the master's messenger.
pub mod cluster;
/// Execution contexts and the framebuffer table.
pub mod context;
/// Frame consumers.
pub mod display;
/// Farm-side command reader.
pub mod farm;
/// Barrier groups.
pub mod group;
/// Wall master device.
pub mod master;
/// Display node threads.
pub mod worker;
