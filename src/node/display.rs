use crate::foundation::core::Vec2i;
use crate::foundation::error::{WallError, WallResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Consumer of assembled frames (the screen of a display node).
pub trait DisplaySink: Send {
    /// Present one RGBA8 frame of `size` pixels.
    fn load_frame(&mut self, rgba: &[u8], size: Vec2i) -> WallResult<()>;

    /// Whether frames cover the whole physical screen rather than a window.
    fn fullscreen(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct Buffers {
    front: Vec<u8>,
    back: Vec<u8>,
    size: Vec2i,
    frames: u64,
    windowed: bool,
}

/// Headless double-buffered display: each load fills the back buffer, then swaps.
///
/// Clones share the same buffers, so a test or a preview window can watch what a node shows.
#[derive(Clone, Debug, Default)]
pub struct DoubleBufferedDisplay {
    inner: Arc<Mutex<Buffers>>,
}

impl DoubleBufferedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation mode, normally taken from `DW_FULLSCREEN`.
    pub fn with_fullscreen(self, fullscreen: bool) -> Self {
        self.inner.lock().windowed = !fullscreen;
        self
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.inner.lock().frames
    }

    /// Copy of the currently shown frame and its size.
    pub fn front(&self) -> (Vec<u8>, Vec2i) {
        let b = self.inner.lock();
        (b.front.clone(), b.size)
    }
}

impl DisplaySink for DoubleBufferedDisplay {
    fn load_frame(&mut self, rgba: &[u8], size: Vec2i) -> WallResult<()> {
        if rgba.len() != size.area() * 4 {
            return Err(WallError::validation(format!(
                "frame of {size} needs {} RGBA bytes, got {}",
                size.area() * 4,
                rgba.len()
            )));
        }
        let mut b = self.inner.lock();
        b.back.clear();
        b.back.extend_from_slice(rgba);
        let Buffers { front, back, .. } = &mut *b;
        std::mem::swap(front, back);
        b.size = size;
        b.frames += 1;
        Ok(())
    }

    fn fullscreen(&self) -> bool {
        !self.inner.lock().windowed
    }
}
