//! Seam between the render farm's compositor and the wall link.

pub mod farm;
