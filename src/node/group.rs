use std::sync::{Arc, Barrier};

/// A set of cooperating processes that can synchronize at a barrier.
pub trait ProcessGroup: Send + Sync {
    /// Index of this member inside the group.
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Block until every member has called `barrier`.
    fn barrier(&self);
}

/// In-process group: members are threads sharing one [`Barrier`].
#[derive(Clone, Debug)]
pub struct LocalGroup {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
}

impl LocalGroup {
    /// Handles for every member of a new group of `size`.
    pub fn members(size: usize) -> Vec<LocalGroup> {
        let barrier = Arc::new(Barrier::new(size));
        (0..size)
            .map(|rank| LocalGroup {
                rank,
                size,
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    /// Group with a single member; barriers return immediately.
    pub fn solo() -> Self {
        Self {
            rank: 0,
            size: 1,
            barrier: Arc::new(Barrier::new(1)),
        }
    }
}

impl ProcessGroup for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}
