use crate::foundation::core::FbHandle;
use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::{WireReader, WireWriter};
use crate::node::context::{MasterContext, WorkerContext};
use crate::work::set_tile::SetTile;
use crate::work::{Work, WorkTag};

/// Render and present one frame of `handle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderFrame {
    pub handle: FbHandle,
    pub channels: u32,
}

impl RenderFrame {
    pub const TAG: WorkTag = 3;

    pub fn decode(r: &mut WireReader<'_>) -> WallResult<Self> {
        Ok(Self {
            handle: FbHandle(r.i64()?),
            channels: r.u32()?,
        })
    }
}

impl Work for RenderFrame {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "RenderFrame"
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_i64(self.handle.0);
        w.put_u32(self.channels);
    }

    /// Collect this node's tiles, then present them in lockstep with the rest of the wall.
    #[tracing::instrument(skip_all, fields(rank = ctx.rank, handle = %self.handle))]
    fn run(&self, ctx: &mut WorkerContext) -> WallResult<()> {
        let fb = ctx.framebuffers.require(self.handle)?;
        fb.begin_frame();
        fb.wait_until_frame_done();
        fb.end_frame();
        let rgba = fb.rgba8_snapshot();

        // No screen swaps before every screen has its tiles.
        ctx.display_group.barrier();
        ctx.display.load_frame(&rgba, fb.size())?;
        ctx.world.barrier();
        tracing::debug!("frame presented");
        Ok(())
    }

    /// Pump `SetTile` work from the farm until the preview has every tile.
    #[tracing::instrument(skip_all, fields(handle = %self.handle))]
    fn run_on_master(&self, ctx: &mut MasterContext) -> WallResult<()> {
        let fb = ctx.framebuffers.require(self.handle)?;
        fb.begin_frame();
        let mut batches = 0usize;
        while !fb.is_frame_ready() {
            let work = ctx.read_work()?;
            if work.tag() != SetTile::TAG {
                return Err(WallError::protocol(format!(
                    "expected SetTile while rendering {}, got {}",
                    self.handle,
                    work.name()
                )));
            }
            work.run_on_master(ctx)?;
            batches += 1;
        }
        fb.end_frame();
        ctx.world.barrier();
        tracing::debug!(batches, "frame complete");
        Ok(())
    }
}
