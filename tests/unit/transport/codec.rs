use super::*;

#[test]
fn repetitive_payload_compresses_and_restores() {
    let payload = vec![7u8; 64 * 1024];
    let codec = Codec::zstd_fast();
    let packed = codec.compress(&payload).expect("should shrink");
    assert!(packed.len() < payload.len());

    let mut out = Vec::new();
    codec.decompress(&packed, payload.len(), &mut out).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn tiny_payload_takes_escape_path() {
    let codec = Codec::zstd_fast();
    assert!(codec.compress(&[1, 2, 3]).is_none());
    assert!(codec.compress(&[]).is_none());
}

#[test]
fn uncompressed_codec_never_compresses() {
    assert!(Codec::None.compress(&[0u8; 4096]).is_none());
    let mut out = Vec::new();
    assert!(Codec::None.decompress(&[1, 2], 2, &mut out).is_err());
}

#[test]
fn corrupt_stream_is_a_codec_error() {
    let mut out = Vec::new();
    let err = Codec::zstd_fast()
        .decompress(&[0xde, 0xad, 0xbe, 0xef, 0x00], 128, &mut out)
        .unwrap_err();
    assert!(matches!(err, WallError::Codec(_)));
}

#[test]
fn size_mismatch_is_a_codec_error() {
    let payload = vec![3u8; 8192];
    let codec = Codec::zstd_fast();
    let packed = codec.compress(&payload).unwrap();
    let mut out = Vec::new();
    assert!(codec.decompress(&packed, payload.len() + 16, &mut out).is_err());
}

#[derive(Clone, Default)]
struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn successful_compression_logs_both_sizes() {
    let sink = Capture::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let packed = tracing::subscriber::with_default(subscriber, || {
        Codec::zstd_fast().compress(&[9u8; 8192]).expect("should shrink")
    });

    let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("payload compressed"), "{logs}");
    assert!(logs.contains("original=8192"), "{logs}");
    assert!(logs.contains(&format!("compressed={}", packed.len())), "{logs}");
}
