use super::*;

fn two_by_one() -> WallGeometry {
    // Two screens of 4x4 tiles side by side.
    WallGeometry::new(WallConfig::new(Vec2i::new(256, 256), Vec2i::new(2, 1))).unwrap()
}

#[test]
fn derived_sizes_include_bezel() {
    let g = WallGeometry::new(
        WallConfig::new(Vec2i::new(100, 50), Vec2i::new(3, 2)).with_bezel(Vec2i::new(10, 5)),
    )
    .unwrap();
    assert_eq!(g.complete_screen(), Vec2i::new(320, 105));
    assert_eq!(g.max_tiles(), Vec2i::new(5, 2));
    assert_eq!(g.worker_count(), 6);
}

#[test]
fn display_rank_follows_orientation() {
    let cfg = WallConfig::new(Vec2i::new(64, 64), Vec2i::new(3, 2));
    let row = WallGeometry::new(cfg).unwrap();
    assert_eq!(row.display_rank(2, 1), 5);
    assert_eq!(row.screen_id(5), Vec2i::new(2, 1));

    let col = WallGeometry::new(cfg.with_orientation(Orientation::ColumnMajor)).unwrap();
    assert_eq!(col.display_rank(2, 1), 5);
    assert_eq!(col.display_rank(1, 0), 2);
    assert_eq!(col.screen_id(2), Vec2i::new(1, 0));
    for rank in 0..6 {
        let id = col.screen_id(rank);
        assert_eq!(col.display_rank(id.x, id.y), rank);
    }
}

#[test]
fn which_rank_clamps_outside_positions() {
    let g = two_by_one();
    assert_eq!(g.which_rank(Vec2i::new(-5, -5)), 0);
    assert_eq!(g.which_rank(Vec2i::new(255, 0)), 0);
    assert_eq!(g.which_rank(Vec2i::new(256, 0)), 1);
    assert_eq!(g.which_rank(Vec2i::new(10_000, 10_000)), 1);
}

#[test]
fn interior_tiles_route_to_exactly_one_rank() {
    let g = two_by_one();
    assert_eq!(g.ranks_for_tile(Vec2i::new(0, 0)), &[0]);
    assert_eq!(g.ranks_for_tile(Vec2i::new(192, 192)), &[0]);
    assert_eq!(g.ranks_for_tile(Vec2i::new(256, 0)), &[1]);
    assert_eq!(g.tiles_for_rank(0).len(), 16);
    assert_eq!(g.tiles_for_rank(1).len(), 16);
}

#[test]
fn straddling_tiles_fan_out_to_every_touched_screen() {
    // 100 px screens do not align with 64 px tiles.
    let g = WallGeometry::new(WallConfig::new(Vec2i::new(100, 100), Vec2i::new(2, 2))).unwrap();
    assert_eq!(g.ranks_for_tile(Vec2i::new(64, 0)), &[0, 1]);
    assert_eq!(g.ranks_for_tile(Vec2i::new(0, 64)), &[0, 2]);
    assert_eq!(g.ranks_for_tile(Vec2i::new(64, 64)), &[0, 1, 2, 3]);
    // Last tile overflows the wall and still resolves through clamping.
    assert_eq!(g.ranks_for_tile(Vec2i::new(192, 192)), &[3]);
}

#[test]
fn off_grid_coordinates_have_no_route() {
    let g = two_by_one();
    assert_eq!(g.tile_id(Vec2i::new(64, 64)), Some(9));
    assert_eq!(g.tile_id(Vec2i::new(65, 64)), None);
    assert_eq!(g.tile_id(Vec2i::new(512, 0)), None);
    assert!(g.ranks_for_tile(Vec2i::new(-64, 0)).is_empty());
}

#[test]
fn node_viewports_are_offset_by_bezel() {
    let g = WallGeometry::new(
        WallConfig::new(Vec2i::new(100, 100), Vec2i::new(2, 1)).with_bezel(Vec2i::new(20, 0)),
    )
    .unwrap();
    let vp = g.node_viewport(1).unwrap();
    assert_eq!(vp.position, Vec2i::new(120, 0));
    assert_eq!(vp.size, Vec2i::new(100, 100));
    assert!(vp.contains(Vec2i::new(120, 99)));
    assert!(!vp.contains(Vec2i::new(119, 0)));
    assert!(matches!(g.node_viewport(2), Err(WallError::Validation(_))));
}

#[test]
fn oversized_walls_are_config_errors() {
    // 4096 screens of 2^20 px do not fit in i32.
    let err = WallGeometry::new(WallConfig::new(Vec2i::new(1 << 20, 64), Vec2i::new(4096, 1)))
        .unwrap_err();
    assert!(matches!(err, WallError::Config(_)), "{err}");

    let err = WallGeometry::new(
        WallConfig::new(Vec2i::new(64, 64), Vec2i::new(2, 1)).with_bezel(Vec2i::new(i32::MAX, 0)),
    )
    .unwrap_err();
    assert!(matches!(err, WallError::Config(_)), "{err}");

    // Fits in i32 but needs far too many tiles.
    let err = WallGeometry::new(WallConfig::new(Vec2i::new(1 << 16, 1 << 16), Vec2i::new(8, 8)))
        .unwrap_err();
    assert!(matches!(err, WallError::Config(_)), "{err}");
}

#[test]
fn broadcast_of_an_oversized_wall_is_rejected_by_nodes() {
    let bytes = WallConfig::new(Vec2i::new(i32::MAX, 1), Vec2i::new(2, 1)).to_bytes();
    let cfg = WallConfig::from_bytes(&bytes).unwrap();
    assert!(matches!(WallGeometry::new(cfg), Err(WallError::Config(_))));
}
