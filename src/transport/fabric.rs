use crate::foundation::error::WallResult;
use crate::transport::frame::{FabricOpts, FrameDecoder, FrameEncoder};
use crate::transport::link::{Link, TcpLink};

/// Point-to-point framed transport.
///
/// `send` delivers exactly the given bytes; the matching `read` on the peer returns a buffer of
/// the same size and content. The buffer returned by `read` is owned by the fabric and only
/// valid until the next `read`.
pub trait Fabric: Send {
    /// Transmit one frame.
    fn send(&mut self, payload: &[u8]) -> WallResult<()>;

    /// Block until one frame has arrived and return its payload.
    fn read(&mut self) -> WallResult<&[u8]>;

    /// Non-blocking check for unread bytes on the connection.
    fn has_data(&mut self) -> WallResult<bool>;
}

/// Synchronous fabric: `send` returns once the frame has been written to the link.
pub struct StreamFabric<L: Link> {
    link: L,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
}

impl<L: Link> StreamFabric<L> {
    pub fn new(link: L, opts: FabricOpts) -> Self {
        Self {
            link,
            encoder: FrameEncoder::new(opts),
            decoder: FrameDecoder::new(opts),
        }
    }

    pub fn opts(&self) -> FabricOpts {
        self.encoder.opts()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub(crate) fn into_parts(self) -> (L, FrameDecoder) {
        (self.link, self.decoder)
    }
}

impl StreamFabric<TcpLink> {
    /// Client role.
    pub fn connect_tcp(host: &str, port: u16, opts: FabricOpts) -> WallResult<Self> {
        Ok(Self::new(TcpLink::connect(host, port)?, opts))
    }

    /// Server role: accepts exactly one peer on `port`.
    pub fn listen_tcp(port: u16, opts: FabricOpts) -> WallResult<Self> {
        Ok(Self::new(TcpLink::listen(port)?, opts))
    }
}

impl<L: Link> Fabric for StreamFabric<L> {
    fn send(&mut self, payload: &[u8]) -> WallResult<()> {
        self.encoder.write_frame(&mut self.link, payload)
    }

    fn read(&mut self) -> WallResult<&[u8]> {
        self.decoder.read_frame(&mut self.link)
    }

    fn has_data(&mut self) -> WallResult<bool> {
        self.link.poll_readable()
    }
}

impl<L: Link> std::fmt::Debug for StreamFabric<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamFabric")
            .field("peer", &self.link.describe())
            .field("opts", &self.encoder.opts())
            .finish()
    }
}
