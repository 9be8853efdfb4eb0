use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::{WireReader, WireWriter};
use crate::node::context::{MasterContext, WorkerContext};
use crate::wall::config::LinkSettings;
use crate::work::{Work, WorkTag};

/// Tile scheduling policy for the render farm, sent once when the wall master starts.
///
/// Wire fields: `dynamic u8 | preallocated_tiles u32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetLoadBalancer {
    /// Hand out tiles on demand instead of a static split.
    pub dynamic: bool,
    /// Tiles each farm worker allocates ahead of time.
    pub preallocated_tiles: u32,
}

impl Default for SetLoadBalancer {
    fn default() -> Self {
        Self {
            dynamic: false,
            preallocated_tiles: 4,
        }
    }
}

impl SetLoadBalancer {
    pub const TAG: WorkTag = 6;

    pub fn from_settings(settings: &LinkSettings) -> Self {
        Self {
            dynamic: settings.dynamic_load_balancer,
            preallocated_tiles: settings.preallocated_tiles,
        }
    }

    pub fn decode(r: &mut WireReader<'_>) -> WallResult<Self> {
        let dynamic = match r.u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(WallError::protocol(format!(
                    "load balancer flag must be 0 or 1, got {other}"
                )));
            }
        };
        Ok(Self {
            dynamic,
            preallocated_tiles: r.u32()?,
        })
    }
}

impl Work for SetLoadBalancer {
    fn tag(&self) -> WorkTag {
        Self::TAG
    }

    fn name(&self) -> &'static str {
        "SetLoadBalancer"
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_u8(u8::from(self.dynamic));
        w.put_u32(self.preallocated_tiles);
    }

    // Only the farm schedules tiles.
    fn run(&self, _ctx: &mut WorkerContext) -> WallResult<()> {
        Ok(())
    }

    fn run_on_master(&self, _ctx: &mut MasterContext) -> WallResult<()> {
        Ok(())
    }
}
