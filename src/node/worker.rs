//! Display node: a command loop plus a tile-delivery thread.

use crate::compositor::framebuffer::TileOutcome;
use crate::foundation::core::Rank;
use crate::foundation::error::{WallError, WallResult};
use crate::node::cluster::{TileDelivery, WorkerEndpoint};
use crate::node::context::{FramebufferTable, WorkerContext};
use crate::node::display::DisplaySink;
use crate::node::group::ProcessGroup;
use crate::wall::config::WallConfig;
use crate::wall::geometry::WallGeometry;
use crate::work::registry::WorkRegistry;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

const TILE_POLL: Duration = Duration::from_millis(50);

/// Running display node.
pub struct WorkerNode {
    rank: Rank,
    framebuffers: FramebufferTable,
    commands: Option<JoinHandle<WallResult<()>>>,
    tiles: Option<JoinHandle<WallResult<u64>>>,
}

impl WorkerNode {
    /// Start both threads. The first command must be the broadcast wall configuration.
    pub fn spawn(endpoint: WorkerEndpoint, display: Box<dyn DisplaySink>) -> WallResult<Self> {
        let WorkerEndpoint {
            rank,
            commands,
            tiles,
            display_group,
            world,
        } = endpoint;
        let framebuffers = FramebufferTable::new();

        let tile_table = framebuffers.clone();
        let tile_thread = std::thread::Builder::new()
            .name(format!("tilewall-tiles-{rank}"))
            .spawn(move || deliver_tiles(rank, tiles, tile_table))
            .map_err(|e| WallError::transport(format!("spawn tile thread: {e}")))?;

        let cmd_table = framebuffers.clone();
        let command_thread = std::thread::Builder::new()
            .name(format!("tilewall-node-{rank}"))
            .spawn(move || {
                let res = command_loop(rank, commands, &cmd_table, display, display_group, world);
                cmd_table.close();
                if let Err(err) = &res {
                    tracing::error!(rank, %err, "display node stopped");
                }
                res
            })
            .map_err(|e| WallError::transport(format!("spawn node thread: {e}")))?;

        Ok(Self {
            rank,
            framebuffers,
            commands: Some(command_thread),
            tiles: Some(tile_thread),
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn framebuffers(&self) -> &FramebufferTable {
        &self.framebuffers
    }

    /// Wait for the command loop to finish (after `Finalize`) and return the number of tiles
    /// the node accepted.
    pub fn join(mut self) -> WallResult<u64> {
        let commands = self.commands.take().map(join_thread).transpose()?;
        // The tile thread notices the closed table within one poll interval.
        self.framebuffers.close();
        let tiles = self.tiles.take().map(join_thread).transpose()?;
        if let Some(res) = commands {
            res?;
        }
        tiles.unwrap_or(Ok(0))
    }
}

fn join_thread<T>(handle: JoinHandle<WallResult<T>>) -> WallResult<WallResult<T>> {
    handle
        .join()
        .map_err(|_| WallError::transport("display node thread panicked"))
}

fn command_loop(
    rank: Rank,
    commands: Receiver<Vec<u8>>,
    framebuffers: &FramebufferTable,
    display: Box<dyn DisplaySink>,
    display_group: Arc<dyn ProcessGroup>,
    world: Arc<dyn ProcessGroup>,
) -> WallResult<()> {
    let config = commands
        .recv()
        .map_err(|_| WallError::transport("master went away before sending the wall config"))?;
    let geometry = Arc::new(WallGeometry::new(WallConfig::from_bytes(&config)?)?);
    let viewport = geometry.node_viewport(rank)?;
    let fullscreen = display.fullscreen();
    tracing::info!(
        rank,
        position = %viewport.position,
        size = %viewport.size,
        fullscreen,
        "display node ready"
    );

    let registry = WorkRegistry::with_wall_units();
    let mut ctx = WorkerContext::new(
        rank,
        geometry,
        framebuffers.clone(),
        display,
        display_group,
        world,
    );
    while !ctx.is_finished() {
        let payload = commands
            .recv()
            .map_err(|_| WallError::transport("master went away without finalizing"))?;
        let work = registry.decode(&payload)?;
        tracing::debug!(rank, unit = work.name(), "running work");
        work.run(&mut ctx)?;
    }
    Ok(())
}

fn deliver_tiles(
    rank: Rank,
    tiles: Receiver<TileDelivery>,
    framebuffers: FramebufferTable,
) -> WallResult<u64> {
    let mut accepted = 0u64;
    loop {
        let TileDelivery { handle, tile } = match tiles.recv_timeout(TILE_POLL) {
            Ok(d) => d,
            Err(RecvTimeoutError::Timeout) if framebuffers.is_closed() => break,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let Some(fb) = framebuffers.wait_get(handle) else {
            tracing::debug!(rank, %handle, "dropping tile for a released framebuffer");
            continue;
        };
        if !fb.is_required(tile.coord) {
            tracing::warn!(rank, %handle, coord = %tile.coord, "stray tile, dropping");
            continue;
        }
        // A tile that outlives its frame waits for the next one, or for shutdown.
        loop {
            match fb.incoming_for(&tile, TILE_POLL) {
                Ok(Some(TileOutcome::Accepted)) => {
                    accepted += 1;
                    break;
                }
                Ok(Some(_)) => break,
                Err(err) => {
                    tracing::error!(rank, %handle, coord = %tile.coord, %err, "rejected tile");
                    break;
                }
                Ok(None) if framebuffers.is_closed() => return Ok(accepted),
                Ok(None) if framebuffers.get(handle).is_none() => break,
                Ok(None) => {}
            }
        }
    }
    Ok(accepted)
}
