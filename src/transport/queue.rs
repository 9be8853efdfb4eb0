//! Background-writer fabric.
//!
//! Producers encode (and compress) frames on their own thread and push them onto a shared
//! queue; one dedicated sender thread drains it onto the link. Delivery is asynchronous and the
//! queue is unbounded, so producers never wait on network backpressure.

use crate::foundation::error::{WallError, WallResult};
use crate::transport::fabric::{Fabric, StreamFabric};
use crate::transport::frame::{FabricOpts, FrameDecoder, FrameEncoder};
use crate::transport::link::Link;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Vec<u8>>,
    in_flight: bool,
    closed: bool,
    failure: Option<String>,
    frames_sent: u64,
}

#[derive(Debug, Default)]
struct QueueShared {
    state: Mutex<QueueState>,
    wake: Condvar,
    drained: Condvar,
}

/// Cloneable producer handle onto a [`QueuedFabric`]'s outbound queue.
#[derive(Clone, Debug)]
pub struct SendQueue {
    shared: Arc<QueueShared>,
    encoder: FrameEncoder,
}

impl SendQueue {
    /// Frame `payload` on the calling thread and queue it for the sender thread.
    pub fn enqueue(&self, payload: &[u8]) -> WallResult<()> {
        let frame = self.encoder.encode(payload)?;
        let mut st = self.shared.state.lock();
        if let Some(failure) = &st.failure {
            return Err(WallError::transport(format!(
                "background sender failed earlier: {failure}"
            )));
        }
        if st.closed {
            return Err(WallError::transport("send queue is closed"));
        }
        st.pending.push_back(frame);
        drop(st);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Block until every queued frame has been written to the link.
    ///
    /// A concurrent close does not cut the wait short: the sender thread drains the queue
    /// before it stops, or records a failure that is returned here.
    pub fn flush(&self) -> WallResult<()> {
        let mut st = self.shared.state.lock();
        self.shared.drained.wait_while(&mut st, |s| {
            s.failure.is_none() && (!s.pending.is_empty() || s.in_flight)
        });
        match &st.failure {
            Some(failure) => Err(WallError::transport(format!(
                "background sender failed: {failure}"
            ))),
            None => Ok(()),
        }
    }

    /// Frames waiting for the sender thread.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Frames the sender thread has written so far.
    pub fn frames_sent(&self) -> u64 {
        self.shared.state.lock().frames_sent
    }

    fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.wake.notify_all();
        self.shared.drained.notify_all();
    }
}

fn sender_loop<L: Link>(mut link: L, shared: Arc<QueueShared>) {
    loop {
        let frame = {
            let mut st = shared.state.lock();
            shared
                .wake
                .wait_while(&mut st, |s| s.pending.is_empty() && !s.closed);
            // Closing still drains whatever was queued before the close.
            let Some(frame) = st.pending.pop_front() else {
                break;
            };
            st.in_flight = true;
            frame
        };

        let res = link.write_all(&frame).and_then(|()| link.flush());

        let mut st = shared.state.lock();
        st.in_flight = false;
        match res {
            Ok(()) => st.frames_sent += 1,
            Err(e) => {
                tracing::warn!(peer = %link.describe(), err = %e, "background sender stopped");
                st.failure = Some(e.to_string());
                st.pending.clear();
                st.closed = true;
            }
        }
        let stop = st.failure.is_some();
        if st.pending.is_empty() {
            shared.drained.notify_all();
        }
        drop(st);
        if stop {
            break;
        }
    }
    shared.drained.notify_all();
}

/// Fabric whose `send` only enqueues; reads stay synchronous on the caller's thread.
///
/// One reader plus the background writer is safe because they touch disjoint buffers.
pub struct QueuedFabric<L: Link> {
    reader: L,
    decoder: FrameDecoder,
    queue: SendQueue,
    sender: Option<JoinHandle<()>>,
}

impl<L: Link> QueuedFabric<L> {
    pub fn new(link: L, opts: FabricOpts) -> WallResult<Self> {
        StreamFabric::new(link, opts).into_queued()
    }

    /// Producer handle usable from any thread.
    pub fn sender(&self) -> SendQueue {
        self.queue.clone()
    }

    /// See [`SendQueue::flush`].
    pub fn flush(&self) -> WallResult<()> {
        self.queue.flush()
    }

    /// Drain the queue, stop the sender thread and report any write failure.
    pub fn close(&mut self) -> WallResult<()> {
        self.queue.close();
        if let Some(handle) = self.sender.take() {
            handle
                .join()
                .map_err(|_| WallError::transport("background sender thread panicked"))?;
        }
        match &self.queue.shared.state.lock().failure {
            Some(failure) => Err(WallError::transport(format!(
                "background sender failed: {failure}"
            ))),
            None => Ok(()),
        }
    }
}

impl<L: Link> StreamFabric<L> {
    /// Move the write side of this fabric onto a dedicated sender thread.
    pub fn into_queued(self) -> WallResult<QueuedFabric<L>> {
        let opts = self.opts();
        let (reader, decoder) = self.into_parts();
        let writer = reader.try_clone_link()?;
        let shared = Arc::new(QueueShared::default());
        let thread_shared = Arc::clone(&shared);
        let sender = std::thread::Builder::new()
            .name("tilewall-sender".to_string())
            .spawn(move || sender_loop(writer, thread_shared))
            .map_err(|e| WallError::transport(format!("spawn sender thread: {e}")))?;
        Ok(QueuedFabric {
            reader,
            decoder,
            queue: SendQueue {
                shared,
                encoder: FrameEncoder::new(opts),
            },
            sender: Some(sender),
        })
    }
}

impl<L: Link> Fabric for QueuedFabric<L> {
    fn send(&mut self, payload: &[u8]) -> WallResult<()> {
        self.queue.enqueue(payload)
    }

    fn read(&mut self) -> WallResult<&[u8]> {
        self.decoder.read_frame(&mut self.reader)
    }

    fn has_data(&mut self) -> WallResult<bool> {
        self.reader.poll_readable()
    }
}

impl<L: Link> Drop for QueuedFabric<L> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(%err, "closing queued fabric");
        }
    }
}
