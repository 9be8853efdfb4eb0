use crate::compositor::framebuffer::DisplayFramebuffer;
use crate::foundation::core::{FbHandle, PixelFormat, Vec2i};
use crate::foundation::error::WallResult;
use crate::foundation::wire::{WireReader, WireWriter};
use crate::node::context::{MasterContext, WorkerContext};
use crate::work::{Work, WorkTag};
use std::sync::Arc;

/// Color channel bit in [`CreateFrameBuffer::channels`].
pub const CHANNEL_COLOR: u32 = 1;
/// Depth channel bit.
pub const CHANNEL_DEPTH: u32 = 2;
/// Accumulation channel bit.
pub const CHANNEL_ACCUM: u32 = 4;

/// Allocate a framebuffer under `handle`.
///
/// The master builds a preview of `size` pixels covering the whole wall; a display node
/// ignores `size` and builds a full-resolution buffer for its own screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateFrameBuffer {
    pub handle: FbHandle,
    pub size: Vec2i,
    pub format: PixelFormat,
    pub channels: u32,
}

impl CreateFrameBuffer {
    pub const TAG: WorkTag = 2;

    pub fn decode(r: &mut WireReader<'_>) -> WallResult<Self> {
        Ok(Self {
            handle: FbHandle(r.i64()?),
            size: r.vec2i()?,
            format: PixelFormat::from_tag(r.u8()?)?,
            channels: r.u32()?,
        })
    }
}

impl Work for CreateFrameBuffer {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "CreateFrameBuffer"
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_i64(self.handle.0);
        w.put_vec2i(self.size);
        w.put_u8(self.format.tag());
        w.put_u32(self.channels);
    }

    fn run(&self, ctx: &mut WorkerContext) -> WallResult<()> {
        let fb = DisplayFramebuffer::for_node(&ctx.geometry, ctx.rank, self.format)?;
        tracing::debug!(
            rank = ctx.rank,
            handle = %self.handle,
            size = %fb.size(),
            tiles = fb.total_tiles(),
            "display framebuffer created"
        );
        ctx.framebuffers.insert(self.handle, Arc::new(fb))
    }

    fn run_on_master(&self, ctx: &mut MasterContext) -> WallResult<()> {
        let fb = DisplayFramebuffer::for_master(&ctx.geometry, self.size, self.format)?;
        tracing::debug!(
            handle = %self.handle,
            size = %self.size,
            ratio = ?fb.ratio(),
            "master framebuffer created"
        );
        ctx.framebuffers.insert(self.handle, Arc::new(fb))
    }
}

/// Drop the framebuffer registered under `handle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseFrameBuffer {
    pub handle: FbHandle,
}

impl ReleaseFrameBuffer {
    pub const TAG: WorkTag = 4;

    pub fn decode(r: &mut WireReader<'_>) -> WallResult<Self> {
        Ok(Self {
            handle: FbHandle(r.i64()?),
        })
    }
}

impl Work for ReleaseFrameBuffer {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "ReleaseFrameBuffer"
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_i64(self.handle.0);
    }

    fn run(&self, ctx: &mut WorkerContext) -> WallResult<()> {
        ctx.framebuffers.release(self.handle);
        Ok(())
    }

    fn run_on_master(&self, ctx: &mut MasterContext) -> WallResult<()> {
        ctx.framebuffers.release(self.handle);
        Ok(())
    }
}
