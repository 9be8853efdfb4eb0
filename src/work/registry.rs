use crate::foundation::error::{WallError, WallResult};
use crate::foundation::wire::WireReader;
use crate::work::create_fb::{CreateFrameBuffer, ReleaseFrameBuffer};
use crate::work::finalize::Finalize;
use crate::work::load_balancer::SetLoadBalancer;
use crate::work::render_frame::RenderFrame;
use crate::work::set_tile::SetTile;
use crate::work::{Work, WorkTag};
use std::collections::HashMap;

/// Decodes the fields of one unit type (the tag has already been consumed).
pub type DecodeFn = fn(&mut WireReader<'_>) -> WallResult<Box<dyn Work>>;

/// Tag → decoder table. New unit types register here; the dispatch loops stay unchanged.
#[derive(Clone, Default)]
pub struct WorkRegistry {
    decoders: HashMap<WorkTag, (&'static str, DecodeFn)>,
}

impl WorkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every unit the wall protocol uses.
    pub fn with_wall_units() -> Self {
        let mut reg = Self::new();
        reg.register(SetTile::TAG, "SetTile", |r| Ok(Box::new(SetTile::decode(r)?)));
        reg.register(CreateFrameBuffer::TAG, "CreateFrameBuffer", |r| {
            Ok(Box::new(CreateFrameBuffer::decode(r)?))
        });
        reg.register(RenderFrame::TAG, "RenderFrame", |r| {
            Ok(Box::new(RenderFrame::decode(r)?))
        });
        reg.register(ReleaseFrameBuffer::TAG, "ReleaseFrameBuffer", |r| {
            Ok(Box::new(ReleaseFrameBuffer::decode(r)?))
        });
        reg.register(Finalize::TAG, "Finalize", |r| Ok(Box::new(Finalize::decode(r)?)));
        reg.register(SetLoadBalancer::TAG, "SetLoadBalancer", |r| {
            Ok(Box::new(SetLoadBalancer::decode(r)?))
        });
        reg
    }

    /// Register `decode` for `tag`, replacing any earlier registration.
    pub fn register(&mut self, tag: WorkTag, name: &'static str, decode: DecodeFn) {
        if let Some((old, _)) = self.decoders.insert(tag, (name, decode)) {
            tracing::debug!(tag, old, new = name, "work decoder replaced");
        }
    }

    pub fn contains(&self, tag: WorkTag) -> bool {
        self.decoders.contains_key(&tag)
    }

    pub fn name_of(&self, tag: WorkTag) -> Option<&'static str> {
        self.decoders.get(&tag).map(|(name, _)| *name)
    }

    /// Decode one `[tag][fields]` payload. Trailing bytes are a protocol error.
    pub fn decode(&self, payload: &[u8]) -> WallResult<Box<dyn Work>> {
        let mut r = WireReader::new(payload);
        let tag = r.u32()?;
        let (name, decode) = self
            .decoders
            .get(&tag)
            .ok_or_else(|| WallError::protocol(format!("unknown work tag {tag}")))?;
        let work = decode(&mut r)?;
        if r.remaining() != 0 {
            return Err(WallError::protocol(format!(
                "{name} payload has {} trailing bytes",
                r.remaining()
            )));
        }
        Ok(work)
    }
}

impl std::fmt::Debug for WorkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.decoders.iter().map(|(t, (n, _))| (*t, *n)).collect();
        names.sort_unstable();
        f.debug_struct("WorkRegistry").field("units", &names).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/work/registry.rs"]
mod tests;
