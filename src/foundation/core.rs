use crate::foundation::error::{WallError, WallResult};

/// Side length, in pixels, of every tile produced by the render farm.
pub const TILE_SIZE: i32 = 64;

/// Index of a display node inside the worker group (0-based).
pub type Rank = u32;

/// Integer 2D vector used for pixel positions, sizes and grid cells.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Vec2i {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Vec2i {
    /// Create a vector from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `v`.
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v }
    }

    /// Component-wise ceiling division by `d`.
    pub fn div_round_up(self, d: Vec2i) -> Self {
        Self {
            x: (self.x + d.x - 1) / d.x,
            y: (self.y + d.y - 1) / d.y,
        }
    }

    /// `x * y`, widened so large screens do not overflow.
    pub fn area(self) -> usize {
        (self.x.max(0) as usize) * (self.y.max(0) as usize)
    }
}

impl std::ops::Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Vec2i {
        Vec2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2i {
    type Output = Vec2i;

    fn sub(self, rhs: Vec2i) -> Vec2i {
        Vec2i::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul for Vec2i {
    type Output = Vec2i;

    fn mul(self, rhs: Vec2i) -> Vec2i {
        Vec2i::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl std::fmt::Display for Vec2i {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Float 2D vector, used for the master preview scale ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec2f {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2f {
    /// Create a vector from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Identity scale.
    pub const ONE: Vec2f = Vec2f::new(1.0, 1.0);
}

/// Pixel layout of a tile or framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// No color data is transported; tiles only count toward completion.
    None,
    /// Four 8-bit channels per pixel.
    Rgba8,
    /// Four `f32` channels per pixel.
    Rgba32F,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::None => 0,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgba32F => 16,
        }
    }

    /// Bytes occupied by one `TILE_SIZE x TILE_SIZE` tile.
    pub const fn tile_bytes(self) -> usize {
        (TILE_SIZE as usize) * (TILE_SIZE as usize) * self.bytes_per_pixel()
    }

    /// Wire tag.
    pub const fn tag(self) -> u8 {
        match self {
            PixelFormat::None => 0,
            PixelFormat::Rgba8 => 1,
            PixelFormat::Rgba32F => 2,
        }
    }

    /// Inverse of [`PixelFormat::tag`].
    pub fn from_tag(tag: u8) -> WallResult<Self> {
        match tag {
            0 => Ok(PixelFormat::None),
            1 => Ok(PixelFormat::Rgba8),
            2 => Ok(PixelFormat::Rgba32F),
            other => Err(WallError::protocol(format!(
                "unknown pixel format tag {other}"
            ))),
        }
    }
}

/// Identifier of a framebuffer object, shared by the farm, the master and every display node.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FbHandle(pub i64);

impl std::fmt::Display for FbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fb#{}", self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
