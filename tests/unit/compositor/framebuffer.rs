use super::*;
use crate::wall::config::WallConfig;
use std::sync::Arc;
use std::time::Duration;

fn wall(local: i32, cols: i32, rows: i32) -> WallGeometry {
    WallGeometry::new(WallConfig::new(Vec2i::splat(local), Vec2i::new(cols, rows))).unwrap()
}

fn rgba_at(fb: &DisplayFramebuffer, x: i32, y: i32) -> [u8; 4] {
    let snap = fb.color_snapshot();
    let at = (y * fb.size().x + x) as usize * 4;
    [snap[at], snap[at + 1], snap[at + 2], snap[at + 3]]
}

#[test]
fn frame_completes_regardless_of_order() {
    let g = wall(256, 2, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap();
    assert_eq!(fb.total_tiles(), 16);

    fb.begin_frame();
    let mut tiles = g.tiles_for_rank(0);
    tiles.reverse();
    for (i, coord) in tiles.iter().enumerate() {
        assert!(!fb.is_frame_ready());
        let out = fb.incoming(&Tile::blank(PixelFormat::None, *coord)).unwrap();
        assert_eq!(out, TileOutcome::Accepted, "tile {i}");
    }
    assert!(fb.is_frame_ready());
    fb.wait_until_frame_done();
    fb.end_frame();
    assert!(!fb.is_active());
}

#[test]
fn stray_tiles_do_not_affect_completion() {
    let g = wall(256, 2, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap();
    fb.begin_frame();
    for coord in g.tiles_for_rank(1) {
        let out = fb.incoming(&Tile::blank(PixelFormat::None, coord)).unwrap();
        assert_eq!(out, TileOutcome::Ignored);
    }
    assert_eq!(fb.missing().len(), 16);
    assert!(!fb.is_frame_ready());
}

#[test]
fn duplicate_delivery_is_idempotent() {
    let g = wall(128, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::Rgba8).unwrap();
    fb.begin_frame();
    let tile = Tile::solid_rgba8(Vec2i::new(0, 0), [5, 5, 5, 255]);
    assert_eq!(fb.incoming(&tile).unwrap(), TileOutcome::Accepted);
    assert_eq!(fb.incoming(&tile).unwrap(), TileOutcome::Duplicate);
    assert_eq!(fb.missing().len(), 3);

    for coord in fb.missing() {
        fb.incoming(&Tile::solid_rgba8(coord, [1, 1, 1, 255])).unwrap();
    }
    assert!(fb.is_frame_ready());
    assert_eq!(
        fb.incoming(&tile).unwrap(),
        TileOutcome::Duplicate,
        "late duplicate keeps the frame ready"
    );
    assert!(fb.is_frame_ready());
}

#[test]
fn begin_frame_resets_missing_set() {
    let g = wall(64, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap();
    fb.begin_frame();
    fb.incoming(&Tile::blank(PixelFormat::None, Vec2i::new(0, 0)))
        .unwrap();
    assert!(fb.is_frame_ready());
    fb.end_frame();
    fb.begin_frame();
    assert!(!fb.is_frame_ready());
    assert_eq!(fb.missing(), vec![Vec2i::new(0, 0)]);
}

#[test]
fn incoming_waits_for_begin_frame() {
    let g = wall(64, 1, 1);
    let fb = Arc::new(DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap());
    let early = {
        let fb = Arc::clone(&fb);
        std::thread::spawn(move || {
            fb.incoming(&Tile::blank(PixelFormat::None, Vec2i::new(0, 0)))
                .unwrap()
        })
    };
    std::thread::sleep(Duration::from_millis(50));
    assert!(!early.is_finished());
    assert!(!fb.is_frame_ready());

    fb.begin_frame();
    assert_eq!(early.join().unwrap(), TileOutcome::Accepted);
    assert!(fb.is_frame_ready());
}

#[test]
fn wait_until_frame_done_wakes_on_last_tile() {
    let g = wall(128, 1, 1);
    let fb = Arc::new(DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap());
    fb.begin_frame();
    let producer = {
        let fb = Arc::clone(&fb);
        let tiles = g.tiles_for_rank(0);
        std::thread::spawn(move || {
            for coord in tiles {
                std::thread::sleep(Duration::from_millis(5));
                fb.incoming(&Tile::blank(PixelFormat::None, coord)).unwrap();
            }
        })
    };
    fb.wait_until_frame_done();
    assert!(fb.is_frame_ready());
    producer.join().unwrap();
}

#[test]
fn node_buffer_translates_by_local_position() {
    let g = wall(128, 2, 1);
    let fb = DisplayFramebuffer::for_node(&g, 1, PixelFormat::Rgba8).unwrap();
    assert_eq!(fb.position(), Vec2i::new(128, 0));
    fb.begin_frame();
    fb.incoming(&Tile::solid_rgba8(Vec2i::new(192, 64), [10, 20, 30, 255]))
        .unwrap();
    assert_eq!(rgba_at(&fb, 64, 64), [10, 20, 30, 255]);
    assert_eq!(rgba_at(&fb, 127, 127), [10, 20, 30, 255]);
    assert_eq!(rgba_at(&fb, 63, 64), [0, 0, 0, 0]);
}

#[test]
fn straddling_tile_is_clipped_to_node_bounds() {
    let g = wall(100, 2, 1);
    let left = DisplayFramebuffer::for_node(&g, 0, PixelFormat::Rgba8).unwrap();
    let right = DisplayFramebuffer::for_node(&g, 1, PixelFormat::Rgba8).unwrap();
    let tile = Tile::solid_rgba8(Vec2i::new(64, 0), [7, 7, 7, 255]);
    left.begin_frame();
    right.begin_frame();
    assert_eq!(left.incoming(&tile).unwrap(), TileOutcome::Accepted);
    assert_eq!(right.incoming(&tile).unwrap(), TileOutcome::Accepted);

    assert_eq!(rgba_at(&left, 99, 0), [7, 7, 7, 255]);
    assert_eq!(rgba_at(&left, 63, 0), [0, 0, 0, 0]);
    assert_eq!(rgba_at(&right, 27, 63), [7, 7, 7, 255]);
    assert_eq!(rgba_at(&right, 28, 0), [0, 0, 0, 0]);
}

#[test]
fn master_preview_downscales() {
    let g = wall(256, 2, 1);
    let fb = DisplayFramebuffer::for_master(&g, Vec2i::new(256, 128), PixelFormat::Rgba8).unwrap();
    assert_eq!(fb.ratio(), Vec2f::new(0.5, 0.5));
    assert_eq!(fb.total_tiles(), 32);

    fb.accumulate(&Tile::solid_rgba8(Vec2i::new(256, 0), [200, 0, 0, 255]))
        .unwrap();
    assert_eq!(rgba_at(&fb, 128, 0), [200, 0, 0, 255]);
    assert_eq!(rgba_at(&fb, 159, 31), [200, 0, 0, 255]);
    assert_eq!(rgba_at(&fb, 160, 0), [0, 0, 0, 0]);
    assert_eq!(rgba_at(&fb, 128, 32), [0, 0, 0, 0]);
}

#[test]
fn mismatched_format_is_a_protocol_error() {
    let g = wall(64, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::Rgba32F).unwrap();
    fb.begin_frame();
    let err = fb
        .incoming(&Tile::solid_rgba8(Vec2i::new(0, 0), [0, 0, 0, 0]))
        .unwrap_err();
    assert!(matches!(err, WallError::Protocol(_)));
    assert!(!fb.is_frame_ready());
}

#[test]
fn float_buffer_converts_for_display() {
    let g = wall(64, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::Rgba32F).unwrap();
    fb.clear([255, 0, 0, 255]);
    let rgba = fb.rgba8_snapshot();
    assert_eq!(rgba.len(), 64 * 64 * 4);
    assert_eq!(&rgba[..4], &[255, 0, 0, 255]);

    let mut pixels = Vec::with_capacity(PixelFormat::Rgba32F.tile_bytes());
    for _ in 0..TILE_SIZE * TILE_SIZE {
        for c in [2.0f32, 0.5, -1.0, 1.0] {
            pixels.extend_from_slice(&c.to_le_bytes());
        }
    }
    fb.begin_frame();
    fb.incoming(&Tile::new(PixelFormat::Rgba32F, Vec2i::new(0, 0), pixels).unwrap())
        .unwrap();
    assert_eq!(&fb.rgba8_snapshot()[..4], &[255, 128, 0, 255]);
}

#[test]
fn node_without_tiles_is_ready_on_begin() {
    let fb = DisplayFramebuffer::new(
        Vec2i::new(8, 8),
        Vec2i::default(),
        Vec2f::ONE,
        PixelFormat::None,
        std::iter::empty(),
    )
    .unwrap();
    fb.begin_frame();
    assert!(fb.is_frame_ready());
    fb.wait_until_frame_done();
}

#[test]
fn bounded_delivery_gives_up_without_an_active_frame() {
    let g = wall(64, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::None).unwrap();
    let tile = Tile::blank(PixelFormat::None, Vec2i::new(0, 0));
    assert_eq!(fb.incoming_for(&tile, Duration::from_millis(10)).unwrap(), None);
    assert!(!fb.is_frame_ready());

    fb.begin_frame();
    assert_eq!(
        fb.incoming_for(&tile, Duration::from_millis(10)).unwrap(),
        Some(TileOutcome::Accepted)
    );
    fb.end_frame();
    assert_eq!(fb.incoming_for(&tile, Duration::from_millis(10)).unwrap(), None);
}

#[test]
fn short_pixel_buffer_is_rejected_before_blitting() {
    let g = wall(64, 1, 1);
    let fb = DisplayFramebuffer::for_node(&g, 0, PixelFormat::Rgba8).unwrap();
    fb.begin_frame();
    let short = Tile {
        format: PixelFormat::Rgba8,
        coord: Vec2i::new(0, 0),
        pixels: vec![0; 4],
    };
    let err = fb.incoming(&short).unwrap_err();
    assert!(matches!(err, WallError::Protocol(_)));
    assert_eq!(fb.missing(), vec![Vec2i::new(0, 0)]);

    // The buffer stays usable afterwards.
    let tile = Tile::solid_rgba8(Vec2i::new(0, 0), [9, 9, 9, 255]);
    assert_eq!(fb.accumulate(&tile).unwrap(), TileOutcome::Accepted);
    assert!(fb.is_frame_ready());
}
