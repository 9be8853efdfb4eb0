//! Byte-stream backends the framed transport runs over.

use crate::foundation::error::{WallError, WallResult};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// How long [`Link::poll_readable`] may wait for a byte to show up.
const POLL_WINDOW: Duration = Duration::from_millis(1);

/// A reliable, in-order, point-to-point byte stream.
pub trait Link: Read + Write + Send + 'static {
    /// Report whether unread bytes are waiting, without consuming them.
    ///
    /// A peer that has closed the connection is reported as
    /// [`WallError::ConnectionDropped`].
    fn poll_readable(&mut self) -> WallResult<bool>;

    /// Second handle on the same connection, used by the background writer.
    fn try_clone_link(&self) -> WallResult<Self>
    where
        Self: Sized;

    /// Stop both directions; blocked readers on other handles wake up with EOF.
    fn shutdown(&self) -> WallResult<()>;

    /// Human-readable peer description for logs.
    fn describe(&self) -> String;
}

/// Plain TCP socket backend.
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    /// Wrap a connected stream. Nagle is disabled so small tile frames leave immediately.
    pub fn from_stream(stream: TcpStream) -> WallResult<Self> {
        stream
            .set_nodelay(true)
            .map_err(|e| WallError::from_io("set TCP_NODELAY", e))?;
        Ok(Self { stream })
    }

    /// Client role: connect to `host:port`.
    pub fn connect(host: &str, port: u16) -> WallResult<Self> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| WallError::transport(format!("resolve {host}:{port}: {e}")))?;
        let mut last = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => return Self::from_stream(stream),
                Err(e) => last = Some(e),
            }
        }
        Err(match last {
            Some(e) => WallError::transport(format!("connect {host}:{port}: {e}")),
            None => WallError::transport(format!("{host}:{port} resolved to no address")),
        })
    }

    /// Server role: wait for exactly one peer on an already bound listener.
    pub fn accept(listener: &TcpListener) -> WallResult<Self> {
        let (stream, peer) = listener
            .accept()
            .map_err(|e| WallError::transport(format!("accept: {e}")))?;
        tracing::info!(%peer, "peer connected");
        Self::from_stream(stream)
    }

    /// Server role: bind `port` on every interface and accept exactly one peer.
    pub fn listen(port: u16) -> WallResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|e| WallError::transport(format!("bind port {port}: {e}")))?;
        tracing::info!(port, "waiting for peer");
        Self::accept(&listener)
    }
}

impl Read for TcpLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Link for TcpLink {
    fn poll_readable(&mut self) -> WallResult<bool> {
        // The receive timeout only affects reads, so a writer sharing the socket is undisturbed.
        self.stream
            .set_read_timeout(Some(POLL_WINDOW))
            .map_err(|e| WallError::from_io("arm poll timeout", e))?;
        let mut probe = [0u8; 1];
        let res = self.stream.peek(&mut probe);
        self.stream
            .set_read_timeout(None)
            .map_err(|e| WallError::from_io("clear poll timeout", e))?;
        match res {
            Ok(0) => Err(WallError::connection_dropped(format!(
                "peer {} closed the connection",
                self.describe()
            ))),
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(false)
            }
            Err(e) => Err(WallError::connection_dropped(format!(
                "probe on {} failed: {e}",
                self.describe()
            ))),
        }
    }

    fn try_clone_link(&self) -> WallResult<Self> {
        let stream = self
            .stream
            .try_clone()
            .map_err(|e| WallError::from_io("clone tcp stream", e))?;
        Ok(Self { stream })
    }

    fn shutdown(&self) -> WallResult<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(WallError::from_io("shutdown", e)),
        }
    }

    fn describe(&self) -> String {
        self.stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<disconnected>".to_string())
    }
}

/// Pacing parameters for [`PacedLink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingOpts {
    /// Target send rate in megabits per second.
    pub rate_mbps: f64,
    /// Largest chunk handed to the inner link per write.
    pub segment_bytes: usize,
}

impl Default for PacingOpts {
    fn default() -> Self {
        Self {
            rate_mbps: 1000.0,
            segment_bytes: 4096,
        }
    }
}

/// Rate-paced backend: splits writes into fixed segments and spaces them to hold a constant
/// send rate, instead of relying on the inner stream's congestion window.
#[derive(Debug)]
pub struct PacedLink<L> {
    inner: L,
    opts: PacingOpts,
    next_send: Option<Instant>,
}

impl<L: Link> PacedLink<L> {
    pub fn new(inner: L, opts: PacingOpts) -> WallResult<Self> {
        if opts.rate_mbps.is_nan() || opts.rate_mbps <= 0.0 || opts.segment_bytes == 0 {
            return Err(WallError::validation(
                "pacing needs a positive rate and segment size",
            ));
        }
        Ok(Self {
            inner,
            opts,
            next_send: None,
        })
    }

    /// Change the target rate; takes effect on the next segment.
    pub fn set_rate(&mut self, rate_mbps: f64) -> WallResult<()> {
        if rate_mbps.is_nan() || rate_mbps <= 0.0 {
            return Err(WallError::validation("pacing rate must be positive"));
        }
        self.opts.rate_mbps = rate_mbps;
        Ok(())
    }

    pub fn opts(&self) -> PacingOpts {
        self.opts
    }

    fn segment_period(&self, bytes: usize) -> Duration {
        Duration::from_secs_f64((bytes as f64 * 8.0) / (self.opts.rate_mbps * 1_000_000.0))
    }
}

impl<L: Link> Read for PacedLink<L> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<L: Link> Write for PacedLink<L> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.opts.segment_bytes);
        let now = Instant::now();
        if let Some(at) = self.next_send
            && at > now
        {
            std::thread::sleep(at - now);
        }
        let written = self.inner.write(&buf[..n])?;
        let start = self.next_send.map_or(now, |at| at.max(now));
        self.next_send = Some(start + self.segment_period(written));
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<L: Link> Link for PacedLink<L> {
    fn poll_readable(&mut self) -> WallResult<bool> {
        self.inner.poll_readable()
    }

    fn try_clone_link(&self) -> WallResult<Self> {
        Ok(Self {
            inner: self.inner.try_clone_link()?,
            opts: self.opts,
            next_send: None,
        })
    }

    fn shutdown(&self) -> WallResult<()> {
        self.inner.shutdown()
    }

    fn describe(&self) -> String {
        format!("{} (paced {} Mbit/s)", self.inner.describe(), self.opts.rate_mbps)
    }
}
