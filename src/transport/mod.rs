//! Framed point-to-point transport ("fabric").
//!
//! A [`Fabric`](fabric::Fabric) moves whole frames over one [`Link`](link::Link). The codec
//! ([`Codec`](codec::Codec)) and the backend are independent and compose freely; the
//! [`QueuedFabric`](queue::QueuedFabric) variant moves writes onto a background thread.

/// Payload compression.
pub mod codec;
/// Fabric trait and the synchronous implementation.
pub mod fabric;
/// Frame layout, encoder and decoder.
pub mod frame;
/// Byte-stream backends.
pub mod link;
/// Background-writer fabric.
pub mod queue;
