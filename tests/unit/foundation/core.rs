use super::*;

#[test]
fn div_round_up_covers_partial_tiles() {
    let screen = Vec2i::new(130, 64);
    assert_eq!(
        screen.div_round_up(Vec2i::splat(TILE_SIZE)),
        Vec2i::new(3, 1)
    );
}

#[test]
fn pixel_format_tags_are_stable() {
    for f in [PixelFormat::None, PixelFormat::Rgba8, PixelFormat::Rgba32F] {
        assert_eq!(PixelFormat::from_tag(f.tag()).unwrap(), f);
    }
    assert!(PixelFormat::from_tag(9).is_err());
}

#[test]
fn tile_bytes_follow_pixel_size() {
    assert_eq!(PixelFormat::None.tile_bytes(), 0);
    assert_eq!(
        PixelFormat::Rgba8.tile_bytes(),
        (TILE_SIZE * TILE_SIZE * 4) as usize
    );
    assert_eq!(
        PixelFormat::Rgba32F.tile_bytes(),
        (TILE_SIZE * TILE_SIZE * 16) as usize
    );
}
