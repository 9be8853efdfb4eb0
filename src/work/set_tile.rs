use crate::foundation::core::FbHandle;
use crate::foundation::error::WallResult;
use crate::foundation::wire::{WireReader, WireWriter};
use crate::node::context::{MasterContext, WorkerContext};
use crate::work::batch::TileBatch;
use crate::work::{Work, WorkTag};
use std::sync::Arc;

/// Finished tiles for one framebuffer, sent by the farm to the wall master.
///
/// Wire fields: `handle i64 | size u64 | batch[size]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetTile {
    pub handle: FbHandle,
    pub data: TileBatch,
}

impl SetTile {
    pub const TAG: WorkTag = 1;

    pub fn new(handle: FbHandle, data: TileBatch) -> Self {
        Self { handle, data }
    }

    /// Wrap one encoded tile message.
    pub fn single(handle: FbHandle, message: &[u8]) -> Self {
        Self::new(handle, TileBatch::single(message))
    }

    pub fn decode(r: &mut WireReader<'_>) -> WallResult<Self> {
        let handle = FbHandle(r.i64()?);
        let n = r.len_prefix()?;
        let data = TileBatch::from_bytes(r.take(n)?)?;
        Ok(Self { handle, data })
    }
}

impl Work for SetTile {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "SetTile"
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        let batch = self.data.to_bytes();
        w.put_i64(self.handle.0);
        w.put_u64(batch.len() as u64);
        w.put_bytes(&batch);
    }

    fn run(&self, _ctx: &mut WorkerContext) -> WallResult<()> {
        // Display nodes receive routed tiles directly; the batch only matters on the master.
        Ok(())
    }

    fn run_on_master(&self, ctx: &mut MasterContext) -> WallResult<()> {
        let fb = ctx.framebuffers.require(self.handle)?;
        for tile in self.data.tiles()? {
            fb.accumulate(&tile)?;
            let ranks = ctx.geometry.ranks_for_tile(tile.coord);
            if ranks.is_empty() {
                tracing::debug!(coord = %tile.coord, "tile has no recipient screen");
                continue;
            }
            let tile = Arc::new(tile);
            for &rank in ranks {
                ctx.messenger
                    .send_tile(rank, self.handle, Arc::clone(&tile))?;
            }
        }
        Ok(())
    }
}
