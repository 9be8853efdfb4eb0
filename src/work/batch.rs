use crate::compositor::tile::Tile;
use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::{WireReader, WireWriter};

/// One or more encoded tiles packed as `count u64 | sizes u64[count] | data`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileBatch {
    sizes: Vec<u64>,
    data: Vec<u8>,
}

impl TileBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch holding one already-encoded tile message.
    pub fn single(message: &[u8]) -> Self {
        let mut b = Self::new();
        b.push_encoded(message);
        b
    }

    pub fn from_tiles<'a>(tiles: impl IntoIterator<Item = &'a Tile>) -> Self {
        let mut b = Self::new();
        for t in tiles {
            b.push(t);
        }
        b
    }

    pub fn push(&mut self, tile: &Tile) {
        self.push_encoded(&tile.encode());
    }

    pub fn push_encoded(&mut self, message: &[u8]) {
        self.sizes.push(message.len() as u64);
        self.data.extend_from_slice(message);
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Encoded tile messages in insertion order.
    pub fn messages(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut at = 0usize;
        self.sizes.iter().map(move |&n| {
            let msg = &self.data[at..at + n as usize];
            at += n as usize;
            msg
        })
    }

    /// Decode every message into a [`Tile`].
    pub fn tiles(&self) -> WallResult<Vec<Tile>> {
        self.messages().map(Tile::decode).collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(8 + self.sizes.len() * 8 + self.data.len());
        w.put_u64(self.sizes.len() as u64);
        for &n in &self.sizes {
            w.put_u64(n);
        }
        w.put_bytes(&self.data);
        w.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> WallResult<Self> {
        let mut r = WireReader::new(bytes);
        let count = r.u64()?;
        if count.saturating_mul(8) > r.remaining() as u64 {
            return Err(WallError::protocol(format!(
                "tile batch declares {count} entries in {} bytes",
                bytes.len()
            )));
        }
        let sizes = (0..count).map(|_| r.u64()).collect::<WallResult<Vec<u64>>>()?;
        let total = sizes
            .iter()
            .try_fold(0u64, |acc, &n| acc.checked_add(n))
            .ok_or_else(|| WallError::protocol("tile batch sizes overflow"))?;
        let data = r.rest();
        if total != data.len() as u64 {
            return Err(WallError::protocol(format!(
                "tile batch sizes sum to {total} but {} data bytes follow",
                data.len()
            )));
        }
        Ok(Self {
            sizes,
            data: data.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/work/batch.rs"]
mod tests;
