use super::*;
use crate::foundation::core::{PixelFormat, Vec2i};

#[test]
fn layout_is_count_then_sizes_then_data() {
    let mut b = TileBatch::new();
    b.push_encoded(b"abc");
    b.push_encoded(b"de");
    let bytes = b.to_bytes();
    assert_eq!(&bytes[..8], &2u64.to_le_bytes());
    assert_eq!(&bytes[8..16], &3u64.to_le_bytes());
    assert_eq!(&bytes[16..24], &2u64.to_le_bytes());
    assert_eq!(&bytes[24..], b"abcde");

    let back = TileBatch::from_bytes(&bytes).unwrap();
    let msgs: Vec<&[u8]> = back.messages().collect();
    assert_eq!(msgs, vec![&b"abc"[..], &b"de"[..]]);
}

#[test]
fn tiles_decode_in_order() {
    let a = Tile::solid_rgba8(Vec2i::new(0, 0), [1, 1, 1, 1]);
    let b = Tile::blank(PixelFormat::Rgba8, Vec2i::new(64, 0));
    let batch = TileBatch::from_tiles([&a, &b]);
    assert_eq!(batch.len(), 2);
    let tiles = TileBatch::from_bytes(&batch.to_bytes()).unwrap().tiles().unwrap();
    assert_eq!(tiles, vec![a, b]);
}

#[test]
fn inconsistent_sizes_are_rejected() {
    let mut bytes = TileBatch::single(b"hello").to_bytes();
    bytes.pop();
    assert!(matches!(
        TileBatch::from_bytes(&bytes),
        Err(WallError::Protocol(_))
    ));

    let mut huge = Vec::new();
    huge.extend_from_slice(&u64::MAX.to_le_bytes());
    assert!(matches!(
        TileBatch::from_bytes(&huge),
        Err(WallError::Protocol(_))
    ));
}

#[test]
fn empty_batch_is_valid() {
    let b = TileBatch::from_bytes(&TileBatch::new().to_bytes()).unwrap();
    assert!(b.is_empty());
    assert!(b.tiles().unwrap().is_empty());
}
