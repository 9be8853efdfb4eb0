//! Length-prefixed frame layout.
//!
//! Uncompressed fabrics write `[len][bytes]` with a `u32` or `u64` little-endian prefix.
//! Compressed fabrics always use `u64` fields:
//!
//! - `[len | ESCAPE_FLAG][bytes]` when the payload travels raw (escape path)
//! - `[len][compressed_len][compressed bytes]` otherwise

use crate::foundation::error::{WallError, WallResult};
use crate::transport::codec::Codec;
use std::io::{Read, Write};

/// Top bit of the compressed-mode size field: the payload that follows is raw.
pub const ESCAPE_FLAG: u64 = 1 << 63;

/// Largest payload a single frame may carry.
pub const MAX_FRAME_BYTES: usize = 1 << 30;

/// Width of the length prefix used by uncompressed fabrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LengthPrefix {
    /// 4-byte prefix.
    U32,
    /// 8-byte prefix.
    #[default]
    U64,
}

impl LengthPrefix {
    const fn width(self) -> usize {
        match self {
            LengthPrefix::U32 => 4,
            LengthPrefix::U64 => 8,
        }
    }
}

/// Framing options shared by both ends of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FabricOpts {
    /// Payload codec.
    pub codec: Codec,
    /// Prefix width when `codec` is [`Codec::None`]; compressed frames always use `u64`.
    pub prefix: LengthPrefix,
}

impl FabricOpts {
    /// Raw frames behind an 8-byte prefix.
    pub fn raw() -> Self {
        Self::default()
    }

    /// zstd-compressed frames with the raw escape path.
    pub fn compressed() -> Self {
        Self {
            codec: Codec::zstd_fast(),
            prefix: LengthPrefix::U64,
        }
    }
}

/// Turns payloads into complete frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameEncoder {
    opts: FabricOpts,
}

impl FrameEncoder {
    pub fn new(opts: FabricOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> FabricOpts {
        self.opts
    }

    fn check_len(payload: &[u8]) -> WallResult<()> {
        if payload.len() >= MAX_FRAME_BYTES {
            return Err(WallError::validation(format!(
                "frame payload of {} bytes exceeds the {MAX_FRAME_BYTES} byte limit",
                payload.len()
            )));
        }
        Ok(())
    }

    /// Encode `payload` into one self-contained frame.
    pub fn encode(&self, payload: &[u8]) -> WallResult<Vec<u8>> {
        Self::check_len(payload)?;
        let len = payload.len() as u64;
        match self.opts.codec {
            Codec::None => {
                let mut out = Vec::with_capacity(self.opts.prefix.width() + payload.len());
                match self.opts.prefix {
                    LengthPrefix::U32 => out.extend_from_slice(&(len as u32).to_le_bytes()),
                    LengthPrefix::U64 => out.extend_from_slice(&len.to_le_bytes()),
                }
                out.extend_from_slice(payload);
                Ok(out)
            }
            codec => match codec.compress(payload) {
                Some(packed) => {
                    let mut out = Vec::with_capacity(16 + packed.len());
                    out.extend_from_slice(&len.to_le_bytes());
                    out.extend_from_slice(&(packed.len() as u64).to_le_bytes());
                    out.extend_from_slice(&packed);
                    Ok(out)
                }
                None => {
                    let mut out = Vec::with_capacity(8 + payload.len());
                    out.extend_from_slice(&(len | ESCAPE_FLAG).to_le_bytes());
                    out.extend_from_slice(payload);
                    Ok(out)
                }
            },
        }
    }

    /// Encode and write one frame, then flush.
    pub fn write_frame<W: Write + ?Sized>(&self, w: &mut W, payload: &[u8]) -> WallResult<()> {
        Self::check_len(payload)?;
        if self.opts.codec.is_compressed() {
            let frame = self.encode(payload)?;
            w.write_all(&frame)
                .map_err(|e| WallError::from_io("write frame", e))?;
        } else {
            let len = payload.len() as u64;
            let header = match self.opts.prefix {
                LengthPrefix::U32 => (len as u32).to_le_bytes().to_vec(),
                LengthPrefix::U64 => len.to_le_bytes().to_vec(),
            };
            w.write_all(&header)
                .map_err(|e| WallError::from_io("write frame header", e))?;
            w.write_all(payload)
                .map_err(|e| WallError::from_io("write frame body", e))?;
        }
        w.flush().map_err(|e| WallError::from_io("flush frame", e))
    }
}

/// Reads frames into an internally owned scratch buffer.
///
/// The slice returned by [`FrameDecoder::read_frame`] borrows the decoder, so it is only valid
/// until the next read.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    opts: FabricOpts,
    scratch: Vec<u8>,
    packed: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(opts: FabricOpts) -> Self {
        Self {
            opts,
            scratch: Vec::new(),
            packed: Vec::new(),
        }
    }

    pub fn opts(&self) -> FabricOpts {
        self.opts
    }

    /// Block until one whole frame has arrived and return its payload.
    pub fn read_frame<R: Read + ?Sized>(&mut self, r: &mut R) -> WallResult<&[u8]> {
        if !self.opts.codec.is_compressed() {
            let len = match self.opts.prefix {
                LengthPrefix::U32 => u64::from(u32::from_le_bytes(read_array(r)?)),
                LengthPrefix::U64 => u64::from_le_bytes(read_array(r)?),
            };
            let len = checked_len(len)?;
            read_body(r, &mut self.scratch, len)?;
            return Ok(&self.scratch);
        }

        let header = u64::from_le_bytes(read_array(r)?);
        if header & ESCAPE_FLAG != 0 {
            let len = checked_len(header & !ESCAPE_FLAG)?;
            read_body(r, &mut self.scratch, len)?;
            return Ok(&self.scratch);
        }

        let original = checked_len(header)?;
        let packed_len = checked_len(u64::from_le_bytes(read_array(r)?))?;
        read_body(r, &mut self.packed, packed_len)?;
        self.opts
            .codec
            .decompress(&self.packed, original, &mut self.scratch)?;
        Ok(&self.scratch)
    }
}

fn checked_len(len: u64) -> WallResult<usize> {
    if len >= MAX_FRAME_BYTES as u64 {
        return Err(WallError::protocol(format!(
            "frame announces {len} bytes, limit is {MAX_FRAME_BYTES}"
        )));
    }
    Ok(len as usize)
}

fn read_array<const N: usize, R: Read + ?Sized>(r: &mut R) -> WallResult<[u8; N]> {
    let mut out = [0u8; N];
    r.read_exact(&mut out)
        .map_err(|e| WallError::from_io("read frame header", e))?;
    Ok(out)
}

fn read_body<R: Read + ?Sized>(r: &mut R, buf: &mut Vec<u8>, len: usize) -> WallResult<()> {
    buf.clear();
    buf.resize(len, 0);
    r.read_exact(buf)
        .map_err(|e| WallError::from_io("read frame body", e))
}

#[cfg(test)]
#[path = "../../tests/unit/transport/frame.rs"]
mod tests;
