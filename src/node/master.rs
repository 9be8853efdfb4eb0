//! Wall-facing device on the master process.

use crate::compositor::framebuffer::DisplayFramebuffer;
use crate::foundation::core::{FbHandle, PixelFormat, Vec2i};
use crate::foundation::error::WallResult;
use crate::node::cluster::Messenger;
use crate::node::context::MasterContext;
use crate::node::group::ProcessGroup;
use crate::transport::fabric::Fabric;
use crate::wall::config::WallConfig;
use crate::wall::geometry::WallGeometry;
use crate::work::create_fb::{CreateFrameBuffer, ReleaseFrameBuffer};
use crate::work::finalize::Finalize;
use crate::work::load_balancer::SetLoadBalancer;
use crate::work::registry::WorkRegistry;
use crate::work::render_frame::RenderFrame;
use crate::work::{Work, encode_work};
use std::sync::Arc;

/// Drives the farm and the display nodes: every command goes to the farm over its fabric,
/// to every display node through the messenger, and then runs locally.
pub struct MasterNode {
    ctx: MasterContext,
    next_handle: i64,
}

impl MasterNode {
    /// Resolve the wall, broadcast its configuration to every display node and tell the farm
    /// how to schedule tiles.
    pub fn new(
        config: WallConfig,
        balancer: SetLoadBalancer,
        messenger: Arc<dyn Messenger>,
        world: Arc<dyn ProcessGroup>,
        mut farm: Box<dyn Fabric>,
    ) -> WallResult<Self> {
        let geometry = Arc::new(WallGeometry::new(config)?);
        messenger.broadcast_work(&config.to_bytes())?;
        farm.send(&encode_work(&balancer))?;
        tracing::info!(
            complete = %geometry.complete_screen(),
            workers = messenger.worker_count(),
            dynamic = balancer.dynamic,
            preallocated = balancer.preallocated_tiles,
            "wall master ready"
        );
        Ok(Self {
            ctx: MasterContext::new(
                geometry,
                messenger,
                world,
                farm,
                Arc::new(WorkRegistry::with_wall_units()),
            ),
            next_handle: 1,
        })
    }

    pub fn geometry(&self) -> &WallGeometry {
        &self.ctx.geometry
    }

    /// Master-side preview buffer of `handle`.
    pub fn preview(&self, handle: FbHandle) -> Option<Arc<DisplayFramebuffer>> {
        self.ctx.framebuffers.get(handle)
    }

    /// Create a framebuffer everywhere. The farm renders the complete screen; the master keeps
    /// a `size` preview; display nodes build full-resolution buffers of their own screen.
    pub fn create_framebuffer(
        &mut self,
        size: Vec2i,
        format: PixelFormat,
        channels: u32,
    ) -> WallResult<FbHandle> {
        let handle = FbHandle(self.next_handle);
        self.next_handle += 1;

        let farm_cmd = CreateFrameBuffer {
            handle,
            size: self.ctx.geometry.complete_screen(),
            format,
            channels,
        };
        self.ctx.farm().send(&encode_work(&farm_cmd))?;

        let cmd = CreateFrameBuffer {
            handle,
            size,
            format,
            channels,
        };
        self.dispatch(&cmd)?;
        Ok(handle)
    }

    /// Render one frame: returns after the farm delivered every tile, all display nodes
    /// presented it, and the world barrier passed.
    #[tracing::instrument(skip(self))]
    pub fn render_frame(&mut self, handle: FbHandle, channels: u32) -> WallResult<()> {
        let cmd = RenderFrame { handle, channels };
        self.ctx.farm().send(&encode_work(&cmd))?;
        self.dispatch(&cmd)
    }

    pub fn release_framebuffer(&mut self, handle: FbHandle) -> WallResult<()> {
        let cmd = ReleaseFrameBuffer { handle };
        self.ctx.farm().send(&encode_work(&cmd))?;
        self.dispatch(&cmd)
    }

    /// Block for the next work unit from the farm.
    pub fn read_work(&mut self) -> WallResult<Box<dyn Work>> {
        self.ctx.read_work()
    }

    /// Like [`MasterNode::read_work`], but returns `None` when the farm has sent nothing yet.
    pub fn poll_work(&mut self) -> WallResult<Option<Box<dyn Work>>> {
        if self.ctx.farm().has_data()? {
            Ok(Some(self.ctx.read_work()?))
        } else {
            Ok(None)
        }
    }

    /// Tell the farm and every display node to stop.
    pub fn shutdown(mut self) -> WallResult<()> {
        let bytes = encode_work(&Finalize);
        self.ctx.farm().send(&bytes)?;
        self.ctx.messenger.broadcast_work(&bytes)?;
        self.ctx.framebuffers.close();
        tracing::info!("wall master shut down");
        Ok(())
    }

    fn dispatch(&mut self, work: &dyn Work) -> WallResult<()> {
        self.ctx.messenger.broadcast_work(&encode_work(work))?;
        work.run_on_master(&mut self.ctx)
    }
}
