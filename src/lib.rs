#![forbid(unsafe_code)]

pub mod bridge;
pub mod compositor;
pub mod foundation;
pub mod node;
pub mod transport;
pub mod wall;
pub mod work;

pub use bridge::farm::{FarmBridge, TileHook};
pub use compositor::framebuffer::{DisplayFramebuffer, TileOutcome};
pub use compositor::tile::Tile;
pub use foundation::core::{FbHandle, PixelFormat, Rank, TILE_SIZE, Vec2f, Vec2i};
pub use foundation::error::{WallError, WallResult};
pub use node::cluster::{LocalCluster, Messenger, WorkerEndpoint};
pub use node::display::{DisplaySink, DoubleBufferedDisplay};
pub use node::farm::{FarmCommand, FarmLink};
pub use node::group::{LocalGroup, ProcessGroup};
pub use node::master::MasterNode;
pub use node::worker::WorkerNode;
pub use transport::codec::Codec;
pub use transport::fabric::{Fabric, StreamFabric};
pub use transport::frame::{FabricOpts, LengthPrefix};
pub use transport::link::{Link, PacedLink, PacingOpts, TcpLink};
pub use transport::queue::{QueuedFabric, SendQueue};
pub use wall::config::{LinkSettings, Orientation, WallConfig};
pub use wall::geometry::{Viewport, WallGeometry};
pub use work::load_balancer::SetLoadBalancer;
pub use work::registry::WorkRegistry;
pub use work::{Work, WorkTag, encode_work};
