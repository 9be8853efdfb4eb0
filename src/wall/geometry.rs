use crate::foundation::core::{Rank, TILE_SIZE, Vec2i};
use crate::foundation::error::{WallError, WallResult};
use crate::wall::config::{Orientation, WallConfig};
use smallvec::SmallVec;

/// Recipient ranks of one tile. A tile touches at most four screens.
pub type RankSet = SmallVec<[Rank; 4]>;

/// Largest tile grid a wall may resolve to.
pub const MAX_WALL_TILES: usize = 1 << 24;

/// `screen * count + bezel * (count - 1)` along one axis, plus the screen pitch
/// (`screen + bezel`), both of which must fit in `i32`.
fn wall_extent(screen: i32, count: i32, bezel: i32, axis: &str) -> WallResult<i32> {
    screen
        .checked_add(bezel)
        .and_then(|_| screen.checked_mul(count))
        .and_then(|px| bezel.checked_mul(count - 1).and_then(|b| px.checked_add(b)))
        .ok_or_else(|| {
            WallError::config(format!(
                "wall {axis} overflows: {count} screens of {screen} px with {bezel} px bezel"
            ))
        })
}

/// Pixel rectangle one display node shows, in complete-screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub position: Vec2i,
    pub size: Vec2i,
}

impl Viewport {
    pub fn contains(&self, p: Vec2i) -> bool {
        p.x >= self.position.x
            && p.y >= self.position.y
            && p.x < self.position.x + self.size.x
            && p.y < self.position.y + self.size.y
    }
}

/// Resolved wall layout plus the precomputed tile routing table.
#[derive(Clone, Debug)]
pub struct WallGeometry {
    config: WallConfig,
    complete_screen: Vec2i,
    max_tiles: Vec2i,
    routes: Vec<RankSet>,
}

impl WallGeometry {
    pub fn new(config: WallConfig) -> WallResult<Self> {
        config.validate()?;
        let complete_screen = Vec2i::new(
            wall_extent(config.local_screen.x, config.display_config.x, config.bezel.x, "width")?,
            wall_extent(config.local_screen.y, config.display_config.y, config.bezel.y, "height")?,
        );
        let max_tiles = Vec2i::new(
            complete_screen.x / TILE_SIZE + i32::from(complete_screen.x % TILE_SIZE != 0),
            complete_screen.y / TILE_SIZE + i32::from(complete_screen.y % TILE_SIZE != 0),
        );
        if config.display_config.area() > i32::MAX as usize {
            return Err(WallError::config(format!(
                "a {} grid has more screens than ranks can address",
                config.display_config
            )));
        }
        if max_tiles.area() > MAX_WALL_TILES {
            return Err(WallError::config(format!(
                "a {complete_screen} wall needs {} tiles, limit is {MAX_WALL_TILES}",
                max_tiles.area()
            )));
        }

        let mut geom = Self {
            config,
            complete_screen,
            max_tiles,
            routes: Vec::with_capacity(max_tiles.area()),
        };
        let routes: Vec<RankSet> = geom.tiles().map(|t| geom.route_corners(t)).collect();
        geom.routes = routes;

        tracing::debug!(
            complete = %complete_screen,
            tiles = %max_tiles,
            workers = geom.worker_count(),
            "wall geometry resolved"
        );
        Ok(geom)
    }

    pub fn config(&self) -> &WallConfig {
        &self.config
    }

    /// Pixel size of the whole wall including bezel gaps.
    pub fn complete_screen(&self) -> Vec2i {
        self.complete_screen
    }

    /// Tile grid size covering [`WallGeometry::complete_screen`].
    pub fn max_tiles(&self) -> Vec2i {
        self.max_tiles
    }

    /// Number of display nodes.
    pub fn worker_count(&self) -> usize {
        self.config.display_config.area()
    }

    /// Linear rank of grid cell `(x, y)`.
    pub fn display_rank(&self, x: i32, y: i32) -> Rank {
        let grid = self.config.display_config;
        let r = match self.config.orientation {
            Orientation::RowMajor => x + y * grid.x,
            Orientation::ColumnMajor => y + x * grid.y,
        };
        r as Rank
    }

    /// Grid cell of `rank`; inverse of [`WallGeometry::display_rank`].
    pub fn screen_id(&self, rank: Rank) -> Vec2i {
        let grid = self.config.display_config;
        let r = rank as i32;
        match self.config.orientation {
            Orientation::RowMajor => Vec2i::new(r % grid.x, r / grid.x),
            Orientation::ColumnMajor => Vec2i::new(r / grid.y, r % grid.y),
        }
    }

    /// Rank owning pixel `pos`. Positions outside the wall clamp to the nearest screen.
    pub fn which_rank(&self, pos: Vec2i) -> Rank {
        let pitch = self.config.local_screen + self.config.bezel;
        let grid = self.config.display_config;
        let cx = pos.x.div_euclid(pitch.x).clamp(0, grid.x - 1);
        let cy = pos.y.div_euclid(pitch.y).clamp(0, grid.y - 1);
        self.display_rank(cx, cy)
    }

    /// Linear tile index of a tile-aligned coordinate, `None` when off the tile grid.
    pub fn tile_id(&self, coord: Vec2i) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x % TILE_SIZE != 0 || coord.y % TILE_SIZE != 0 {
            return None;
        }
        let t = Vec2i::new(coord.x / TILE_SIZE, coord.y / TILE_SIZE);
        if t.x >= self.max_tiles.x || t.y >= self.max_tiles.y {
            return None;
        }
        Some((t.y * self.max_tiles.x + t.x) as usize)
    }

    /// Every rank whose screen holds a corner of the tile at `coord`; empty off the tile grid.
    pub fn ranks_for_tile(&self, coord: Vec2i) -> &[Rank] {
        match self.tile_id(coord) {
            Some(id) => &self.routes[id],
            None => &[],
        }
    }

    /// Tile origins covering the complete screen, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = Vec2i> + '_ {
        let max = self.max_tiles;
        (0..max.y).flat_map(move |ty| {
            (0..max.x).map(move |tx| Vec2i::new(tx * TILE_SIZE, ty * TILE_SIZE))
        })
    }

    /// Tiles routed to `rank`.
    pub fn tiles_for_rank(&self, rank: Rank) -> Vec<Vec2i> {
        self.tiles()
            .zip(&self.routes)
            .filter(|(_, ranks)| ranks.contains(&rank))
            .map(|(t, _)| t)
            .collect()
    }

    /// Visible rectangle of `rank`.
    pub fn node_viewport(&self, rank: Rank) -> WallResult<Viewport> {
        if rank as usize >= self.worker_count() {
            return Err(WallError::validation(format!(
                "rank {rank} outside a wall of {} screens",
                self.worker_count()
            )));
        }
        let id = self.screen_id(rank);
        Ok(Viewport {
            position: (self.config.local_screen + self.config.bezel) * id,
            size: self.config.local_screen,
        })
    }

    fn route_corners(&self, coord: Vec2i) -> RankSet {
        let last = TILE_SIZE - 1;
        let corners = [
            coord,
            coord + Vec2i::new(last, 0),
            coord + Vec2i::new(0, last),
            coord + Vec2i::new(last, last),
        ];
        let mut set = RankSet::new();
        for c in corners {
            let r = self.which_rank(c);
            if !set.contains(&r) {
                set.push(r);
            }
        }
        set.sort_unstable();
        set
    }
}

#[cfg(test)]
#[path = "../../tests/unit/wall/geometry.rs"]
mod tests;
