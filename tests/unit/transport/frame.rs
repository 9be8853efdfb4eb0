use super::*;
use std::io::Cursor;

fn roundtrip(opts: FabricOpts, payload: &[u8]) -> Vec<u8> {
    let mut wire = Vec::new();
    FrameEncoder::new(opts)
        .write_frame(&mut wire, payload)
        .unwrap();
    let mut dec = FrameDecoder::new(opts);
    let mut cursor = Cursor::new(wire);
    dec.read_frame(&mut cursor).unwrap().to_vec()
}

#[test]
fn u32_prefix_layout() {
    let opts = FabricOpts {
        codec: Codec::None,
        prefix: LengthPrefix::U32,
    };
    let frame = FrameEncoder::new(opts).encode(b"abc").unwrap();
    assert_eq!(frame, vec![3, 0, 0, 0, b'a', b'b', b'c']);
    assert_eq!(roundtrip(opts, b"abc"), b"abc");
}

#[test]
fn u64_prefix_layout() {
    let frame = FrameEncoder::new(FabricOpts::raw()).encode(b"xy").unwrap();
    assert_eq!(&frame[..8], &2u64.to_le_bytes());
    assert_eq!(&frame[8..], b"xy");
}

#[test]
fn incompressible_payload_uses_escape_flag() {
    // Pseudo-random bytes do not shrink under zstd.
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let payload: Vec<u8> = (0..4096)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect();

    let frame = FrameEncoder::new(FabricOpts::compressed())
        .encode(&payload)
        .unwrap();
    let header = u64::from_le_bytes(frame[..8].try_into().unwrap());
    assert_ne!(header & ESCAPE_FLAG, 0);
    assert_eq!(header & !ESCAPE_FLAG, payload.len() as u64);
    assert_eq!(roundtrip(FabricOpts::compressed(), &payload), payload);
}

#[test]
fn compressible_payload_uses_two_size_fields() {
    let payload = vec![42u8; 16 * 1024];
    let frame = FrameEncoder::new(FabricOpts::compressed())
        .encode(&payload)
        .unwrap();
    let original = u64::from_le_bytes(frame[..8].try_into().unwrap());
    let packed = u64::from_le_bytes(frame[8..16].try_into().unwrap());
    assert_eq!(original, payload.len() as u64);
    assert_eq!(packed as usize, frame.len() - 16);
    assert_eq!(roundtrip(FabricOpts::compressed(), &payload), payload);
}

#[test]
fn empty_payload_roundtrips_in_every_mode() {
    for opts in [FabricOpts::raw(), FabricOpts::compressed()] {
        assert!(roundtrip(opts, &[]).is_empty());
    }
}

#[test]
fn consecutive_frames_reuse_scratch() {
    let opts = FabricOpts::compressed();
    let enc = FrameEncoder::new(opts);
    let mut wire = Vec::new();
    enc.write_frame(&mut wire, &[1u8; 2048]).unwrap();
    enc.write_frame(&mut wire, b"tail").unwrap();

    let mut dec = FrameDecoder::new(opts);
    let mut cursor = Cursor::new(wire);
    assert_eq!(dec.read_frame(&mut cursor).unwrap(), &[1u8; 2048][..]);
    assert_eq!(dec.read_frame(&mut cursor).unwrap(), b"tail");
}

#[test]
fn truncated_frame_reports_dropped_connection() {
    let mut frame = FrameEncoder::new(FabricOpts::raw())
        .encode(b"hello")
        .unwrap();
    frame.truncate(10);
    let mut dec = FrameDecoder::new(FabricOpts::raw());
    let err = dec.read_frame(&mut Cursor::new(frame)).unwrap_err();
    assert!(matches!(err, WallError::ConnectionDropped(_)));
}

#[test]
fn oversized_announcement_is_rejected() {
    let wire = (MAX_FRAME_BYTES as u64).to_le_bytes().to_vec();
    let mut dec = FrameDecoder::new(FabricOpts::raw());
    let err = dec.read_frame(&mut Cursor::new(wire)).unwrap_err();
    assert!(matches!(err, WallError::Protocol(_)));
}

#[test]
fn corrupt_compressed_body_is_fatal() {
    let mut wire = Vec::new();
    wire.extend_from_slice(&64u64.to_le_bytes());
    wire.extend_from_slice(&4u64.to_le_bytes());
    wire.extend_from_slice(&[9, 9, 9, 9]);
    let mut dec = FrameDecoder::new(FabricOpts::compressed());
    let err = dec.read_frame(&mut Cursor::new(wire)).unwrap_err();
    assert!(matches!(err, WallError::Codec(_)));
}
