//! Master → display-node messaging.

use crate::compositor::tile::Tile;
use crate::foundation::core::{FbHandle, Rank};
use crate::foundation::error::{WallError, WallResult};
use crate::node::group::{LocalGroup, ProcessGroup};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

/// How the master reaches its display nodes.
pub trait Messenger: Send + Sync {
    fn worker_count(&self) -> usize;

    /// Deliver one routed tile to the tile thread of `rank`.
    fn send_tile(&self, rank: Rank, handle: FbHandle, tile: Arc<Tile>) -> WallResult<()>;

    /// Send one work payload to the command loop of every display node.
    fn broadcast_work(&self, payload: &[u8]) -> WallResult<()>;
}

/// A routed tile on its way to a display node.
#[derive(Clone, Debug)]
pub struct TileDelivery {
    pub handle: FbHandle,
    pub tile: Arc<Tile>,
}

/// Everything one in-process display node needs to talk to the master.
pub struct WorkerEndpoint {
    pub rank: Rank,
    pub commands: Receiver<Vec<u8>>,
    pub tiles: Receiver<TileDelivery>,
    pub display_group: Arc<dyn ProcessGroup>,
    pub world: Arc<dyn ProcessGroup>,
}

/// Display nodes running as threads of the master process, connected by channels.
pub struct LocalCluster {
    commands: Vec<Sender<Vec<u8>>>,
    tiles: Vec<Sender<TileDelivery>>,
    world: Arc<LocalGroup>,
}

impl LocalCluster {
    /// Cluster of `workers` display nodes. The master is member 0 of the world group.
    pub fn new(workers: usize) -> (Self, Vec<WorkerEndpoint>) {
        let mut world = LocalGroup::members(workers + 1);
        let master_world = Arc::new(world.remove(0));
        let display = LocalGroup::members(workers);

        let mut commands = Vec::with_capacity(workers);
        let mut tiles = Vec::with_capacity(workers);
        let mut endpoints = Vec::with_capacity(workers);
        for (rank, (display_group, world_group)) in display.into_iter().zip(world).enumerate() {
            let (cmd_tx, cmd_rx) = channel();
            let (tile_tx, tile_rx) = channel();
            commands.push(cmd_tx);
            tiles.push(tile_tx);
            endpoints.push(WorkerEndpoint {
                rank: rank as Rank,
                commands: cmd_rx,
                tiles: tile_rx,
                display_group: Arc::new(display_group),
                world: Arc::new(world_group),
            });
        }
        (
            Self {
                commands,
                tiles,
                world: master_world,
            },
            endpoints,
        )
    }

    /// The master's handle on the world group.
    pub fn world(&self) -> Arc<dyn ProcessGroup> {
        self.world.clone()
    }
}

impl Messenger for LocalCluster {
    fn worker_count(&self) -> usize {
        self.commands.len()
    }

    fn send_tile(&self, rank: Rank, handle: FbHandle, tile: Arc<Tile>) -> WallResult<()> {
        let tx = self.tiles.get(rank as usize).ok_or_else(|| {
            WallError::validation(format!(
                "rank {rank} outside a cluster of {}",
                self.tiles.len()
            ))
        })?;
        tx.send(TileDelivery { handle, tile })
            .map_err(|_| WallError::transport(format!("display node {rank} is gone")))
    }

    fn broadcast_work(&self, payload: &[u8]) -> WallResult<()> {
        for (rank, tx) in self.commands.iter().enumerate() {
            tx.send(payload.to_vec())
                .map_err(|_| WallError::transport(format!("display node {rank} is gone")))?;
        }
        Ok(())
    }
}
