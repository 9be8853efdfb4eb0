use crate::foundation::core::{PixelFormat, TILE_SIZE, Vec2i};
use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::{WireReader, WireWriter};

/// Bytes preceding the pixel data in an encoded tile: format tag plus `x`, `y`.
pub const TILE_HEADER_BYTES: usize = 1 + 4 + 4;

/// One `TILE_SIZE x TILE_SIZE` block of rendered pixels at a complete-screen coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub format: PixelFormat,
    /// Top-left pixel of the tile on the complete screen.
    pub coord: Vec2i,
    /// Row-major pixels; exactly `format.tile_bytes()` long.
    pub pixels: Vec<u8>,
}

impl Tile {
    pub fn new(format: PixelFormat, coord: Vec2i, pixels: Vec<u8>) -> WallResult<Self> {
        if pixels.len() != format.tile_bytes() {
            return Err(WallError::validation(format!(
                "{format:?} tile needs {} pixel bytes, got {}",
                format.tile_bytes(),
                pixels.len()
            )));
        }
        Ok(Self {
            format,
            coord,
            pixels,
        })
    }

    /// Zero-filled tile.
    pub fn blank(format: PixelFormat, coord: Vec2i) -> Self {
        Self {
            format,
            coord,
            pixels: vec![0; format.tile_bytes()],
        }
    }

    /// Tile filled with one RGBA8 color.
    pub fn solid_rgba8(coord: Vec2i, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat((TILE_SIZE * TILE_SIZE) as usize);
        Self {
            format: PixelFormat::Rgba8,
            coord,
            pixels,
        }
    }

    /// Bytes of the pixel at tile-local `(x, y)`.
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let at = (y * TILE_SIZE + x) as usize * bpp;
        &self.pixels[at..at + bpp]
    }

    pub fn encoded_len(&self) -> usize {
        TILE_HEADER_BYTES + self.pixels.len()
    }

    pub fn encode_into(&self, w: &mut WireWriter) {
        w.put_u8(self.format.tag());
        w.put_vec2i(self.coord);
        w.put_bytes(&self.pixels);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(self.encoded_len());
        self.encode_into(&mut w);
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> WallResult<Self> {
        let mut r = WireReader::new(bytes);
        let format = PixelFormat::from_tag(r.u8()?)?;
        let coord = r.vec2i()?;
        let pixels = r.rest();
        if pixels.len() != format.tile_bytes() {
            return Err(WallError::protocol(format!(
                "tile at {coord} carries {} pixel bytes, {format:?} needs {}",
                pixels.len(),
                format.tile_bytes()
            )));
        }
        Ok(Self {
            format,
            coord,
            pixels: pixels.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/tile.rs"]
mod tests;
