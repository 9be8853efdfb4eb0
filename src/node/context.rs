//! State handed to work units when they execute.

use crate::compositor::framebuffer::DisplayFramebuffer;
use crate::foundation::core::{FbHandle, Rank};
use crate::foundation::error::{WallError, WallResult};
use crate::node::cluster::Messenger;
use crate::node::display::DisplaySink;
use crate::node::group::ProcessGroup;
use crate::transport::fabric::Fabric;
use crate::wall::geometry::WallGeometry;
use crate::work::Work;
use crate::work::registry::WorkRegistry;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recently released handles remembered so late tiles for them are dropped, oldest first out.
const RELEASED_HISTORY: usize = 256;

#[derive(Debug, Default)]
struct TableState {
    live: HashMap<FbHandle, Arc<DisplayFramebuffer>>,
    released: VecDeque<FbHandle>,
    closed: bool,
}

#[derive(Debug, Default)]
struct TableShared {
    state: Mutex<TableState>,
    changed: Condvar,
}

/// Framebuffers of one node keyed by handle. Clones share the table.
#[derive(Clone, Debug, Default)]
pub struct FramebufferTable {
    shared: Arc<TableShared>,
}

impl FramebufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: FbHandle, fb: Arc<DisplayFramebuffer>) -> WallResult<()> {
        let mut st = self.shared.state.lock();
        if st.live.contains_key(&handle) {
            return Err(WallError::protocol(format!("{handle} already exists")));
        }
        st.released.retain(|h| *h != handle);
        st.live.insert(handle, fb);
        drop(st);
        self.shared.changed.notify_all();
        Ok(())
    }

    pub fn get(&self, handle: FbHandle) -> Option<Arc<DisplayFramebuffer>> {
        self.shared.state.lock().live.get(&handle).cloned()
    }

    /// Like [`FramebufferTable::get`], but a missing handle is a protocol error.
    pub fn require(&self, handle: FbHandle) -> WallResult<Arc<DisplayFramebuffer>> {
        self.get(handle)
            .ok_or_else(|| WallError::protocol(format!("unknown framebuffer {handle}")))
    }

    /// Wait for `handle` to be created. Returns `None` once it has been released or the
    /// table is closed.
    pub fn wait_get(&self, handle: FbHandle) -> Option<Arc<DisplayFramebuffer>> {
        let mut st = self.shared.state.lock();
        self.shared.changed.wait_while(&mut st, |s| {
            !s.live.contains_key(&handle) && !s.released.contains(&handle) && !s.closed
        });
        st.live.get(&handle).cloned()
    }

    pub fn release(&self, handle: FbHandle) -> Option<Arc<DisplayFramebuffer>> {
        let mut st = self.shared.state.lock();
        let fb = st.live.remove(&handle);
        st.released.retain(|h| *h != handle);
        if st.released.len() == RELEASED_HISTORY {
            st.released.pop_front();
        }
        st.released.push_back(handle);
        drop(st);
        self.shared.changed.notify_all();
        fb
    }

    /// Wake every [`FramebufferTable::wait_get`] caller for good.
    pub fn close(&self) {
        let mut st = self.shared.state.lock();
        st.closed = true;
        st.released.clear();
        drop(st);
        self.shared.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Execution context on the wall master.
pub struct MasterContext {
    pub geometry: Arc<WallGeometry>,
    pub framebuffers: FramebufferTable,
    pub messenger: Arc<dyn Messenger>,
    pub world: Arc<dyn ProcessGroup>,
    farm: Box<dyn Fabric>,
    registry: Arc<WorkRegistry>,
}

impl MasterContext {
    pub fn new(
        geometry: Arc<WallGeometry>,
        messenger: Arc<dyn Messenger>,
        world: Arc<dyn ProcessGroup>,
        farm: Box<dyn Fabric>,
        registry: Arc<WorkRegistry>,
    ) -> Self {
        Self {
            geometry,
            framebuffers: FramebufferTable::new(),
            messenger,
            world,
            farm,
            registry,
        }
    }

    /// Block for the next work unit from the farm.
    pub fn read_work(&mut self) -> WallResult<Box<dyn Work>> {
        let payload = self.farm.read()?;
        self.registry.decode(payload)
    }

    /// Link to the render farm.
    pub fn farm(&mut self) -> &mut dyn Fabric {
        self.farm.as_mut()
    }
}

/// Execution context on one display node.
pub struct WorkerContext {
    pub rank: Rank,
    pub geometry: Arc<WallGeometry>,
    pub framebuffers: FramebufferTable,
    pub display: Box<dyn DisplaySink>,
    /// Display nodes only.
    pub display_group: Arc<dyn ProcessGroup>,
    /// Display nodes plus the master.
    pub world: Arc<dyn ProcessGroup>,
    finished: bool,
}

impl WorkerContext {
    pub fn new(
        rank: Rank,
        geometry: Arc<WallGeometry>,
        framebuffers: FramebufferTable,
        display: Box<dyn DisplaySink>,
        display_group: Arc<dyn ProcessGroup>,
        world: Arc<dyn ProcessGroup>,
    ) -> Self {
        Self {
            rank,
            geometry,
            framebuffers,
            display,
            display_group,
            world,
            finished: false,
        }
    }

    /// Stop the command loop after the current unit.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/context.rs"]
mod tests;
