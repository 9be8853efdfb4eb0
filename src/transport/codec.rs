use crate::foundation::error::{WallError, WallResult};

/// Online payload compression applied by the framed transport.
///
/// The codec and the link backend are independent: any codec can run over any [`Link`].
///
/// [`Link`]: crate::transport::link::Link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Codec {
    /// Frames carry raw bytes behind a plain length prefix.
    #[default]
    None,
    /// Frames are zstd-compressed when that makes them smaller.
    Zstd {
        /// zstd compression level (1 is fast, 19 is small).
        level: i32,
    },
}

impl Codec {
    /// Fast zstd setting suited to per-tile frames.
    pub const fn zstd_fast() -> Self {
        Codec::Zstd { level: 1 }
    }

    /// Whether frames use the compressed-mode header layout.
    pub const fn is_compressed(self) -> bool {
        matches!(self, Codec::Zstd { .. })
    }

    /// Compress `payload`, returning `None` when the raw escape path should be used instead.
    ///
    /// Codec failures and results that are not strictly smaller than the input both fall back
    /// to the escape path; they never fail the send.
    pub fn compress(self, payload: &[u8]) -> Option<Vec<u8>> {
        match self {
            Codec::None => None,
            Codec::Zstd { level } => match zstd::bulk::compress(payload, level) {
                Ok(out) if out.len() < payload.len() => {
                    tracing::debug!(
                        original = payload.len(),
                        compressed = out.len(),
                        level,
                        "payload compressed"
                    );
                    Some(out)
                }
                Ok(out) => {
                    tracing::trace!(
                        original = payload.len(),
                        compressed = out.len(),
                        "payload did not shrink, sending raw"
                    );
                    None
                }
                Err(err) => {
                    tracing::trace!(%err, "compression failed, sending raw");
                    None
                }
            },
        }
    }

    /// Decompress `src` into `dst`, which ends up exactly `original_len` bytes long.
    pub fn decompress(self, src: &[u8], original_len: usize, dst: &mut Vec<u8>) -> WallResult<()> {
        match self {
            Codec::None => Err(WallError::codec(
                "received a compressed frame on an uncompressed fabric",
            )),
            Codec::Zstd { .. } => {
                dst.clear();
                dst.resize(original_len, 0);
                let written = zstd::bulk::decompress_to_buffer(src, dst.as_mut_slice())
                    .map_err(|e| {
                        WallError::codec(format!(
                            "decompressing {} bytes into {original_len} failed: {e}",
                            src.len()
                        ))
                    })?;
                if written != original_len {
                    return Err(WallError::codec(format!(
                        "decompressed {written} bytes, header announced {original_len}"
                    )));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transport/codec.rs"]
mod tests;
