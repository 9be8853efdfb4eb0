use crate::foundation::error::WallResult;
use crate::foundation::wire::{WireReader, WireWriter};
use crate::node::context::{MasterContext, WorkerContext};
use crate::work::{Work, WorkTag};

/// Ends a display node's or the farm's command loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Finalize;

impl Finalize {
    pub const TAG: WorkTag = 5;

    pub fn decode(_r: &mut WireReader<'_>) -> WallResult<Self> {
        Ok(Self)
    }
}

impl Work for Finalize {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "Finalize"
    }

    fn encode_fields(&self, _w: &mut WireWriter) {}

    fn run(&self, ctx: &mut WorkerContext) -> WallResult<()> {
        ctx.finish();
        Ok(())
    }

    fn run_on_master(&self, _ctx: &mut MasterContext) -> WallResult<()> {
        Ok(())
    }
}
