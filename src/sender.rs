use crate::packet::{ControlPacket, SourcePacket};
use crate::rs::RsCodec;
use crate::wire::{self, ParityHeader};
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The send-side "current group" (§3/§4.3): one block at a time, buffered
/// until `k` source shards have arrived, then drained as `m` parity
/// packets via polling.
pub struct BlockAssembler {
    codec: Arc<RsCodec>,
    shard_len: usize,
    base_seq: i32,
    timestamp: u32,
    data: Vec<Vec<u8>>,
    collected: usize,
    parity: Vec<Vec<u8>>,
    next_parity: usize,
    /// Send-side flush deadline (§6 `timeout` key); `None` disables it.
    timeout: Option<Duration>,
    opened_at: Option<Instant>,
}

impl BlockAssembler {
    pub fn new(codec: Arc<RsCodec>, shard_len: usize) -> Self {
        Self::with_timeout(codec, shard_len, None)
    }

    pub fn with_timeout(codec: Arc<RsCodec>, shard_len: usize, timeout: Option<Duration>) -> Self {
        let k = codec.k();
        Self {
            shard_len,
            data: vec![vec![0u8; shard_len]; k],
            collected: 0,
            parity: Vec::new(),
            next_parity: 0,
            base_seq: 0,
            timestamp: 0,
            timeout,
            opened_at: None,
            codec,
        }
    }

    /// §4.3 `feed_source`.
    pub fn feed_source(&mut self, pkt: &SourcePacket) {
        if self.collected == 0 {
            self.base_seq = pkt.seq;
            self.timestamp = pkt.timestamp;
            self.opened_at = Some(Instant::now());
        }

        let shard = &mut self.data[self.collected];
        let copy_len = pkt.payload.len().min(self.shard_len);
        shard[..copy_len].copy_from_slice(&pkt.payload[..copy_len]);
        for b in shard[copy_len..].iter_mut() {
            *b = 0;
        }
        self.collected += 1;

        if self.collected == self.codec.k() {
            self.parity = self.codec.encode(&self.data);
            self.next_parity = 0;
            debug!(
                "fec: block base={} ready, encoded {} parity shards",
                self.base_seq,
                self.parity.len()
            );
        }
    }

    /// §4.3 `pack_control`. Fills `out` with the next pending parity shard
    /// and returns `true`, or returns `false` if there's nothing to send
    /// right now (resetting the block once its parity has been fully
    /// drained).
    ///
    /// Opportunistically checks the send-side flush deadline (§6
    /// `timeout`): a block that's been open too long without filling is
    /// forced through encode with its unfilled tail zeroed, since there's
    /// no background timer driving this filter (§5).
    pub fn pack_control(&mut self, out: &mut ControlPacket) -> bool {
        self.flush_if_timed_out();

        if self.next_parity == self.codec.m() {
            self.reset();
            return false;
        }
        if self.collected < self.codec.k() {
            return false;
        }

        let header = ParityHeader {
            block_seq: self.base_seq as u16,
            parity_index: self.next_parity as u8,
            k: self.codec.k() as u8,
        };
        header.encode(out.buffer);
        let payload = &self.parity[self.next_parity];
        out.buffer[wire::HEADER_LEN..wire::HEADER_LEN + self.shard_len].copy_from_slice(payload);
        out.length = wire::HEADER_LEN + self.shard_len;

        self.next_parity += 1;
        true
    }

    fn flush_if_timed_out(&mut self) {
        let Some(timeout) = self.timeout else { return };
        let Some(opened_at) = self.opened_at else { return };
        if self.collected == 0 || self.collected == self.codec.k() || opened_at.elapsed() < timeout {
            return;
        }

        let real = self.collected;
        for shard in &mut self.data[real..] {
            shard.iter_mut().for_each(|b| *b = 0);
        }
        self.collected = self.codec.k();
        self.parity = self.codec.encode(&self.data);
        self.next_parity = 0;
        debug!("fec: block base={} flushed on timeout, {real} of {} shards real", self.base_seq, self.codec.k());
    }

    fn reset(&mut self) {
        self.collected = 0;
        self.next_parity = 0;
        self.parity.clear();
        self.opened_at = None;
    }
}
