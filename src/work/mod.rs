//! Work units exchanged between the render farm, the wall master and the display nodes.
//!
//! Every payload on the wire starts with a `u32` [`WorkTag`] followed by the unit's fields.
//! A [`WorkRegistry`](registry::WorkRegistry) turns payloads back into boxed [`Work`] values.

use crate::foundation::error::WallResult;
use crate::foundation::wire::WireWriter;
use crate::node::context::{MasterContext, WorkerContext};

pub mod batch;
pub mod create_fb;
pub mod finalize;
pub mod load_balancer;
pub mod registry;
pub mod render_frame;
pub mod set_tile;

/// Leading `u32` of every work payload.
pub type WorkTag = u32;

/// A unit of work that can travel over a fabric and execute on either side of the wall.
pub trait Work: Send + std::fmt::Debug {
    fn tag(&self) -> WorkTag;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Append the unit's fields (without the tag).
    fn encode_fields(&self, w: &mut WireWriter);

    /// Execute on a display node.
    fn run(&self, ctx: &mut WorkerContext) -> WallResult<()>;

    /// Execute on the wall master.
    fn run_on_master(&self, ctx: &mut MasterContext) -> WallResult<()>;
}

/// Serialize `work` as `[tag u32][fields]`.
pub fn encode_work(work: &dyn Work) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.put_u32(work.tag());
    work.encode_fields(&mut w);
    w.into_bytes()
}
