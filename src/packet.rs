//! Packet interfaces exposed by the surrounding transport (§6). These are
//! plain data carriers; the transport owns their allocation and lifetime.

/// An outgoing source packet, as handed to `feed_source`.
#[derive(Debug, Clone)]
pub struct SourcePacket {
    pub seq: i32,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}

/// A transport-owned control-packet buffer that `pack_control` writes into.
pub struct ControlPacket<'a> {
    pub buffer: &'a mut [u8],
    pub length: usize,
}

/// A packet reconstructed by the RS decoder, delivered via the provided
/// queue (§4.4/§6). Identical shape to `SourcePacket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltPacket {
    pub seq: i32,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}
