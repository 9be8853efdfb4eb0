use crate::compositor::tile::Tile;
use crate::foundation::core::FbHandle;
use crate::foundation::error::WallResult;
use crate::transport::queue::SendQueue;
use crate::work::batch::TileBatch;
use crate::work::encode_work;
use crate::work::set_tile::SetTile;

/// Called by the farm's own compositor each time it finishes a tile locally.
pub trait TileHook: Send + Sync {
    /// `message` is one encoded [`Tile`].
    fn tile_finished(&self, message: &[u8]) -> WallResult<()>;
}

/// Forwards finished farm tiles to the wall as `SetTile` work.
///
/// Sends go through the background writer, so the farm's compositing path never waits on the
/// wall link.
#[derive(Clone, Debug)]
pub struct FarmBridge {
    handle: FbHandle,
    queue: SendQueue,
}

impl FarmBridge {
    pub fn new(handle: FbHandle, queue: SendQueue) -> Self {
        Self { handle, queue }
    }

    pub fn handle(&self) -> FbHandle {
        self.handle
    }

    /// Send several tiles as one batch.
    pub fn forward_tiles(&self, tiles: &[Tile]) -> WallResult<()> {
        if tiles.is_empty() {
            return Ok(());
        }
        let work = SetTile::new(self.handle, TileBatch::from_tiles(tiles));
        self.queue.enqueue(&encode_work(&work))
    }

    /// Wait until everything forwarded so far is on the wire.
    pub fn flush(&self) -> WallResult<()> {
        self.queue.flush()
    }
}

impl TileHook for FarmBridge {
    fn tile_finished(&self, message: &[u8]) -> WallResult<()> {
        let work = SetTile::single(self.handle, message);
        self.queue.enqueue(&encode_work(&work))
    }
}
