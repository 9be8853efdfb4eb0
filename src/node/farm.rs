use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::WireReader;
use crate::transport::fabric::{Fabric, StreamFabric};
use crate::transport::frame::FabricOpts;
use crate::transport::link::{Link, TcpLink};
use crate::transport::queue::{QueuedFabric, SendQueue};
use crate::work::create_fb::{CreateFrameBuffer, ReleaseFrameBuffer};
use crate::work::finalize::Finalize;
use crate::work::load_balancer::SetLoadBalancer;
use crate::work::render_frame::RenderFrame;

/// Command the wall master sent to the render farm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarmCommand {
    CreateFrameBuffer(CreateFrameBuffer),
    RenderFrame(RenderFrame),
    ReleaseFrameBuffer(ReleaseFrameBuffer),
    SetLoadBalancer(SetLoadBalancer),
    Finalize,
}

/// Farm end of the wall link: commands are read here, tiles leave through [`SendQueue`]s.
pub struct FarmLink<L: Link> {
    fabric: QueuedFabric<L>,
}

impl FarmLink<TcpLink> {
    /// Connect to a wall master listening on `host:port`.
    pub fn connect_tcp(host: &str, port: u16, opts: FabricOpts) -> WallResult<Self> {
        Self::new(StreamFabric::connect_tcp(host, port, opts)?)
    }
}

impl<L: Link> FarmLink<L> {
    pub fn new(fabric: StreamFabric<L>) -> WallResult<Self> {
        Ok(Self {
            fabric: fabric.into_queued()?,
        })
    }

    /// Producer handle for tile traffic toward the wall.
    pub fn sender(&self) -> SendQueue {
        self.fabric.sender()
    }

    pub fn flush(&self) -> WallResult<()> {
        self.fabric.flush()
    }

    /// Block for the next command. Anything but a farm command is a protocol error.
    pub fn next_command(&mut self) -> WallResult<FarmCommand> {
        let payload = self.fabric.read()?;
        let mut r = WireReader::new(payload);
        let cmd = match r.u32()? {
            CreateFrameBuffer::TAG => {
                FarmCommand::CreateFrameBuffer(CreateFrameBuffer::decode(&mut r)?)
            }
            RenderFrame::TAG => FarmCommand::RenderFrame(RenderFrame::decode(&mut r)?),
            ReleaseFrameBuffer::TAG => {
                FarmCommand::ReleaseFrameBuffer(ReleaseFrameBuffer::decode(&mut r)?)
            }
            SetLoadBalancer::TAG => {
                FarmCommand::SetLoadBalancer(SetLoadBalancer::decode(&mut r)?)
            }
            Finalize::TAG => FarmCommand::Finalize,
            tag => {
                return Err(WallError::protocol(format!(
                    "work tag {tag} is not a farm command"
                )));
            }
        };
        if r.remaining() != 0 {
            return Err(WallError::protocol(format!(
                "farm command {cmd:?} has {} trailing bytes",
                r.remaining()
            )));
        }
        tracing::debug!(?cmd, "farm command");
        Ok(cmd)
    }
}
