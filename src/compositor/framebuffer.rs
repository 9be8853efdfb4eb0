//! Per-node frame compositor.
//!
//! A [`DisplayFramebuffer`] owns the color buffer of one display node (or the master preview)
//! and the set of tiles still missing from the current frame. Tiles arrive on whichever thread
//! delivers them; the frame consumer blocks in [`DisplayFramebuffer::wait_until_frame_done`].

use crate::compositor::tile::Tile;
use crate::foundation::core::{PixelFormat, Rank, TILE_SIZE, Vec2f, Vec2i};
use crate::foundation::error::{WallError, WallResult};
use crate::wall::geometry::WallGeometry;
use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

/// What [`DisplayFramebuffer::incoming`] did with a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileOutcome {
    /// First delivery of a required tile in this frame.
    Accepted,
    /// Required tile delivered again within the same frame.
    Duplicate,
    /// Tile not required by this buffer; dropped.
    Ignored,
}

#[derive(Debug)]
struct FrameState {
    active: bool,
    missing: HashSet<Vec2i>,
    color: Vec<u8>,
}

#[derive(Debug)]
pub struct DisplayFramebuffer {
    format: PixelFormat,
    size: Vec2i,
    position: Vec2i,
    ratio: Vec2f,
    required: HashSet<Vec2i>,
    state: Mutex<FrameState>,
    activity: Condvar,
    done: Condvar,
}

impl DisplayFramebuffer {
    /// Buffer of `size` pixels whose top-left sits at `position` on the complete screen.
    /// Incoming tile pixels are scaled by `ratio` after translation.
    pub fn new(
        size: Vec2i,
        position: Vec2i,
        ratio: Vec2f,
        format: PixelFormat,
        required: impl IntoIterator<Item = Vec2i>,
    ) -> WallResult<Self> {
        if size.x <= 0 || size.y <= 0 {
            return Err(WallError::validation(format!(
                "framebuffer size must be positive, got {size}"
            )));
        }
        if ratio.x.is_nan() || ratio.y.is_nan() || ratio.x <= 0.0 || ratio.y <= 0.0 {
            return Err(WallError::validation(format!(
                "framebuffer scale must be positive, got {ratio:?}"
            )));
        }
        let required: HashSet<Vec2i> = required.into_iter().collect();
        Ok(Self {
            format,
            size,
            position,
            ratio,
            state: Mutex::new(FrameState {
                active: false,
                missing: required.clone(),
                color: vec![0; size.area() * format.bytes_per_pixel()],
            }),
            required,
            activity: Condvar::new(),
            done: Condvar::new(),
        })
    }

    /// Downscaled preview of the whole wall; every tile is required.
    pub fn for_master(
        geometry: &WallGeometry,
        requested: Vec2i,
        format: PixelFormat,
    ) -> WallResult<Self> {
        let complete = geometry.complete_screen();
        let ratio = Vec2f::new(
            requested.x as f32 / complete.x as f32,
            requested.y as f32 / complete.y as f32,
        );
        Self::new(requested, Vec2i::default(), ratio, format, geometry.tiles())
    }

    /// Full-resolution buffer of one display node; only tiles routed to `rank` are required.
    pub fn for_node(geometry: &WallGeometry, rank: Rank, format: PixelFormat) -> WallResult<Self> {
        let vp = geometry.node_viewport(rank)?;
        Self::new(
            vp.size,
            vp.position,
            Vec2f::ONE,
            format,
            geometry.tiles_for_rank(rank),
        )
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn size(&self) -> Vec2i {
        self.size
    }

    pub fn position(&self) -> Vec2i {
        self.position
    }

    pub fn ratio(&self) -> Vec2f {
        self.ratio
    }

    /// Number of tiles a frame needs.
    pub fn total_tiles(&self) -> usize {
        self.required.len()
    }

    pub fn is_required(&self, coord: Vec2i) -> bool {
        self.required.contains(&coord)
    }

    pub fn begin_frame(&self) {
        let mut st = self.state.lock();
        st.missing.clone_from(&self.required);
        st.active = true;
        let ready = st.missing.is_empty();
        drop(st);
        self.activity.notify_all();
        if ready {
            self.done.notify_all();
        }
    }

    pub fn end_frame(&self) {
        self.state.lock().active = false;
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn is_frame_ready(&self) -> bool {
        self.state.lock().missing.is_empty()
    }

    /// Block until every required tile of the current frame has arrived.
    pub fn wait_until_frame_done(&self) {
        let mut st = self.state.lock();
        self.done.wait_while(&mut st, |s| !s.missing.is_empty());
    }

    /// Deliver a tile, first waiting for [`DisplayFramebuffer::begin_frame`] if no frame is
    /// active yet.
    pub fn incoming(&self, tile: &Tile) -> WallResult<TileOutcome> {
        let mut st = self.state.lock();
        self.activity.wait_while(&mut st, |s| !s.active);
        self.apply(&mut st, tile)
    }

    /// Like [`DisplayFramebuffer::incoming`], but returns `None` if no frame became active
    /// within `timeout`.
    pub fn incoming_for(&self, tile: &Tile, timeout: Duration) -> WallResult<Option<TileOutcome>> {
        let mut st = self.state.lock();
        let _ = self.activity.wait_while_for(&mut st, |s| !s.active, timeout);
        if !st.active {
            return Ok(None);
        }
        self.apply(&mut st, tile).map(Some)
    }

    /// Deliver a tile without waiting for an active frame.
    pub fn accumulate(&self, tile: &Tile) -> WallResult<TileOutcome> {
        let mut st = self.state.lock();
        self.apply(&mut st, tile)
    }

    /// Tiles still outstanding in the current frame, sorted.
    pub fn missing(&self) -> Vec<Vec2i> {
        let mut out: Vec<Vec2i> = self.state.lock().missing.iter().copied().collect();
        out.sort_unstable_by_key(|c| (c.y, c.x));
        out
    }

    /// Copy of the raw color buffer in the framebuffer's own format.
    pub fn color_snapshot(&self) -> Vec<u8> {
        self.state.lock().color.clone()
    }

    /// Color buffer as RGBA8 for display; float channels are clamped to `[0, 1]`.
    pub fn rgba8_snapshot(&self) -> Vec<u8> {
        let st = self.state.lock();
        match self.format {
            PixelFormat::Rgba8 => st.color.clone(),
            PixelFormat::Rgba32F => st
                .color
                .chunks_exact(4)
                .map(|c| {
                    let v = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                    (v.clamp(0.0, 1.0) * 255.0).round() as u8
                })
                .collect(),
            PixelFormat::None => vec![0; self.size.area() * 4],
        }
    }

    /// Fill the color buffer with one color.
    pub fn clear(&self, rgba: [u8; 4]) {
        let mut st = self.state.lock();
        match self.format {
            PixelFormat::Rgba8 => {
                for px in st.color.chunks_exact_mut(4) {
                    px.copy_from_slice(&rgba);
                }
            }
            PixelFormat::Rgba32F => {
                let mut px = [0u8; 16];
                for (dst, c) in px.chunks_exact_mut(4).zip(rgba) {
                    dst.copy_from_slice(&(f32::from(c) / 255.0).to_le_bytes());
                }
                for dst in st.color.chunks_exact_mut(16) {
                    dst.copy_from_slice(&px);
                }
            }
            PixelFormat::None => {}
        }
    }

    fn apply(&self, st: &mut FrameState, tile: &Tile) -> WallResult<TileOutcome> {
        if !self.required.contains(&tile.coord) {
            tracing::warn!(
                coord = %tile.coord,
                position = %self.position,
                size = %self.size,
                "tile not required by this framebuffer, dropping"
            );
            return Ok(TileOutcome::Ignored);
        }
        if tile.format != self.format {
            return Err(WallError::protocol(format!(
                "{:?} tile at {} delivered to a {:?} framebuffer",
                tile.format, tile.coord, self.format
            )));
        }
        if tile.pixels.len() != self.format.tile_bytes() {
            return Err(WallError::protocol(format!(
                "tile at {} carries {} pixel bytes, a {:?} tile has {}",
                tile.coord,
                tile.pixels.len(),
                self.format,
                self.format.tile_bytes()
            )));
        }

        if self.format != PixelFormat::None {
            if self.ratio == Vec2f::ONE {
                self.blit_unit(&mut st.color, tile);
            } else {
                self.blit_scaled(&mut st.color, tile);
            }
        }

        if !st.missing.remove(&tile.coord) {
            return Ok(TileOutcome::Duplicate);
        }
        if st.missing.is_empty() {
            self.done.notify_all();
        }
        Ok(TileOutcome::Accepted)
    }

    fn blit_unit(&self, color: &mut [u8], tile: &Tile) {
        let bpp = self.format.bytes_per_pixel();
        let origin = tile.coord - self.position;
        let x0 = origin.x.max(0);
        let x1 = (origin.x + TILE_SIZE).min(self.size.x);
        let y0 = origin.y.max(0);
        let y1 = (origin.y + TILE_SIZE).min(self.size.y);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let row_bytes = self.size.x as usize * bpp;
        let tile_row = TILE_SIZE as usize * bpp;
        let span = (x1 - x0) as usize * bpp;
        let src_x = (x0 - origin.x) as usize * bpp;
        let dst_x = x0 as usize * bpp;
        let first_src_row = (y0 - origin.y) as usize;

        color[y0 as usize * row_bytes..y1 as usize * row_bytes]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(i, row)| {
                let src = &tile.pixels[(first_src_row + i) * tile_row + src_x..][..span];
                row[dst_x..dst_x + span].copy_from_slice(src);
            });
    }

    fn blit_scaled(&self, color: &mut [u8], tile: &Tile) {
        let bpp = self.format.bytes_per_pixel();
        let row_bytes = self.size.x as usize * bpp;
        for j in 0..TILE_SIZE {
            for i in 0..TILE_SIZE {
                let p = tile.coord + Vec2i::new(i, j) - self.position;
                let ox = (p.x as f32 * self.ratio.x).floor() as i32;
                let oy = (p.y as f32 * self.ratio.y).floor() as i32;
                if ox < 0 || oy < 0 || ox >= self.size.x || oy >= self.size.y {
                    continue;
                }
                let dst = oy as usize * row_bytes + ox as usize * bpp;
                color[dst..dst + bpp].copy_from_slice(tile.pixel(i, j));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/framebuffer.rs"]
mod tests;
