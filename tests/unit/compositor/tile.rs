use super::*;

#[test]
fn encoded_layout_is_tag_coord_pixels() {
    let tile = Tile::solid_rgba8(Vec2i::new(64, 128), [1, 2, 3, 4]);
    let bytes = tile.encode();
    assert_eq!(bytes.len(), TILE_HEADER_BYTES + PixelFormat::Rgba8.tile_bytes());
    assert_eq!(bytes[0], PixelFormat::Rgba8.tag());
    assert_eq!(&bytes[1..5], &64i32.to_le_bytes());
    assert_eq!(&bytes[5..9], &128i32.to_le_bytes());
    assert_eq!(&bytes[9..13], &[1, 2, 3, 4]);
    assert_eq!(Tile::decode(&bytes).unwrap(), tile);
}

#[test]
fn pixel_less_format_encodes_header_only() {
    let tile = Tile::blank(PixelFormat::None, Vec2i::new(0, 64));
    assert_eq!(tile.encode().len(), TILE_HEADER_BYTES);
    assert_eq!(Tile::decode(&tile.encode()).unwrap().coord, Vec2i::new(0, 64));
}

#[test]
fn short_pixel_data_is_rejected() {
    let mut bytes = Tile::blank(PixelFormat::Rgba8, Vec2i::new(0, 0)).encode();
    bytes.pop();
    assert!(matches!(Tile::decode(&bytes), Err(WallError::Protocol(_))));
    assert!(matches!(
        Tile::new(PixelFormat::Rgba32F, Vec2i::new(0, 0), vec![0; 10]),
        Err(WallError::Validation(_))
    ));
}

#[test]
fn unknown_format_tag_is_rejected() {
    let mut bytes = Tile::blank(PixelFormat::None, Vec2i::new(0, 0)).encode();
    bytes[0] = 9;
    assert!(matches!(Tile::decode(&bytes), Err(WallError::Protocol(_))));
}

#[test]
fn pixel_accessor_indexes_rows() {
    let mut tile = Tile::blank(PixelFormat::Rgba8, Vec2i::new(0, 0));
    let at = (2 * TILE_SIZE as usize + 3) * 4;
    tile.pixels[at..at + 4].copy_from_slice(&[9, 8, 7, 6]);
    assert_eq!(tile.pixel(3, 2), &[9, 8, 7, 6]);
}
