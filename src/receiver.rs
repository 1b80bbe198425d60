//! Receive-side block tracker (§4.4/§3/§5): a bounded table of in-flight
//! blocks keyed by base sequence number, with age- and TTL-based eviction
//! and erasure-decode-on-threshold.

use crate::packet::{RebuiltPacket, SourcePacket};
use crate::pool::ShardPool;
use crate::rs::RsCodec;
use crate::seq;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Thread-safe sink for packets reconstructed by the decoder (§4.4/§6). The
/// transport drains it after each `receive` call.
#[derive(Default)]
pub struct ProvidedQueue(Mutex<Vec<RebuiltPacket>>);

impl ProvidedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, pkt: RebuiltPacket) {
        self.0.lock().unwrap().push(pkt);
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<RebuiltPacket> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

struct ReceiveBlock {
    have_data: Vec<bool>,
    have_parity: Vec<bool>,
    data: Vec<Vec<u8>>,
    parity: Vec<Vec<u8>>,
    have_count: usize,
    /// Timestamp copied from the first *source* shard to arrive (§3).
    /// Parity packets carry no timestamp field on the wire (§6), so this
    /// stays `None` until a real source packet lands, regardless of how
    /// many parity shards arrived first.
    timestamp: Option<u32>,
    created_at: Instant,
    done: bool,
}

impl ReceiveBlock {
    fn new(pool: &ShardPool, k: usize, m: usize, now: Instant) -> Self {
        Self {
            have_data: vec![false; k],
            have_parity: vec![false; m],
            data: (0..k).map(|_| pool.acquire()).collect(),
            parity: (0..m).map(|_| pool.acquire()).collect(),
            have_count: 0,
            timestamp: None,
            created_at: now,
            done: false,
        }
    }

    fn release_into(&mut self, pool: &ShardPool) {
        for shard in self.data.drain(..) {
            pool.release(shard);
        }
        for shard in self.parity.drain(..) {
            pool.release(shard);
        }
    }
}

/// Bounds the tracker's memory: at most `max_groups` blocks live at once,
/// each evicted after `ttl` regardless of completion state (§3 resource
/// bounds).
pub struct BlockTracker {
    codec: Arc<RsCodec>,
    shard_len: usize,
    /// Spacing between consecutive blocks' base sequence numbers in the
    /// source data-sequence space. Only source packets traverse that
    /// space — parity travels out of band via its own `block_seq` header
    /// field — so this is `k`, not `k + m`.
    block_stride: i32,
    rcv_base: i32,
    blocks: HashMap<i32, ReceiveBlock>,
    max_groups: usize,
    ttl: Duration,
    pool: Arc<ShardPool>,
}

impl BlockTracker {
    pub fn new(codec: Arc<RsCodec>, shard_len: usize, isn: i32, max_groups: usize, ttl: Duration) -> Self {
        let block_stride = codec.k() as i32;
        let pool_capacity = max_groups * (codec.k() + codec.m());
        let pool = Arc::new(ShardPool::new(pool_capacity, shard_len));
        Self { codec, shard_len, block_stride, rcv_base: isn, blocks: HashMap::new(), max_groups, ttl, pool }
    }

    /// §4.4 step for an incoming source data packet. Always "accepted" in
    /// the sense that the caller passes it through to the application
    /// regardless of what happens here.
    pub fn on_source(&mut self, pkt: SourcePacket, provided: &ProvidedQueue) {
        if seq::before(pkt.seq, self.rcv_base) {
            return;
        }
        let now = Instant::now();
        self.gc(pkt.seq, now);

        let base = seq::block_base(pkt.seq, self.rcv_base, self.block_stride);
        let idx = seq::index_in_block(pkt.seq, base, self.block_stride);

        let block = self.get_or_create_block(base, now);
        if block.done || block.have_data[idx] {
            return;
        }

        let shard = &mut block.data[idx];
        let copy_len = pkt.payload.len().min(self.shard_len);
        shard[..copy_len].copy_from_slice(&pkt.payload[..copy_len]);
        for b in shard[copy_len..].iter_mut() {
            *b = 0;
        }
        block.have_data[idx] = true;
        if block.timestamp.is_none() {
            block.timestamp = Some(pkt.timestamp);
        }
        block.have_count += 1;

        self.try_decode(base, provided);
    }

    /// §4.4 step for an incoming parity packet, already parsed and k-checked
    /// by the caller.
    pub fn on_parity(&mut self, block_seq: u16, parity_index: usize, payload: &[u8], provided: &ProvidedQueue) {
        if parity_index >= self.codec.m() || payload.len() != self.shard_len {
            warn!("fec: malformed parity packet (index={parity_index}, len={})", payload.len());
            return;
        }

        let base = self.resolve_parity_base(block_seq);
        if seq::before(base, self.rcv_base) {
            return;
        }
        let now = Instant::now();
        self.gc(base, now);

        let block = self.get_or_create_block(base, now);
        if block.done || block.have_parity[parity_index] {
            return;
        }

        block.parity[parity_index].copy_from_slice(payload);
        block.have_parity[parity_index] = true;
        block.have_count += 1;

        self.try_decode(base, provided);
    }

    /// Reconstructs the full 32-bit block base from the wire header's
    /// 16-bit `block_seq`, picking whichever of the three candidates
    /// (same high bits, one less, one more) lands closest to `rcv_base`.
    fn resolve_parity_base(&self, block_seq: u16) -> i32 {
        let high_bits = self.rcv_base & !0xFFFF;
        let candidate = high_bits | block_seq as i32;
        let mut best = candidate;
        let mut best_dist = seq::offset(candidate, self.rcv_base).unsigned_abs();
        for delta in [-0x1_0000i32, 0x1_0000i32] {
            let alt = candidate.wrapping_add(delta);
            let dist = seq::offset(alt, self.rcv_base).unsigned_abs();
            if dist < best_dist {
                best = alt;
                best_dist = dist;
            }
        }
        best
    }

    fn try_decode(&mut self, base: i32, provided: &ProvidedQueue) {
        let k = self.codec.k();
        let m = self.codec.m();
        let block = self.blocks.get_mut(&base).expect("block just inserted");
        if block.done || block.have_count < k {
            return;
        }

        let erasures: Vec<usize> = (0..k)
            .filter(|&i| !block.have_data[i])
            .chain((0..m).filter(|&j| !block.have_parity[j]).map(|j| k + j))
            .collect();

        if erasures.is_empty() {
            block.done = true;
            return;
        }
        if erasures.len() > m {
            return;
        }

        let mut all: Vec<Vec<u8>> = Vec::with_capacity(k + m);
        all.extend(block.data.iter().cloned());
        all.extend(block.parity.iter().cloned());

        match self.codec.decode(&mut all, &erasures) {
            Ok(()) => {
                for &pos in &erasures {
                    if pos < k {
                        provided.push(RebuiltPacket {
                            seq: base.wrapping_add(pos as i32),
                            timestamp: block.timestamp.unwrap_or(0),
                            payload: all[pos].clone(),
                        });
                        block.data[pos] = all[pos].clone();
                        block.have_data[pos] = true;
                    }
                }
                block.done = true;
                debug!("fec: decoded block base={base}, recovered {} positions", erasures.len());
            }
            Err(e) => {
                warn!("fec: decode failed for block base={base}: {e}");
            }
        }
    }

    fn get_or_create_block(&mut self, base: i32, now: Instant) -> &mut ReceiveBlock {
        if !self.blocks.contains_key(&base) {
            if self.blocks.len() >= self.max_groups {
                self.evict_oldest();
            }
            let k = self.codec.k();
            let m = self.codec.m();
            self.blocks.insert(base, ReceiveBlock::new(&self.pool, k, m, now));
        }
        self.blocks.get_mut(&base).unwrap()
    }

    fn evict_oldest(&mut self) {
        if let Some(&oldest) = self
            .blocks
            .keys()
            .min_by_key(|&&base| seq::offset(base, self.rcv_base))
        {
            if let Some(mut block) = self.blocks.remove(&oldest) {
                block.release_into(&self.pool);
            }
        }
    }

    /// TTL and age-window eviction (§3). `pivot` is the sequence (or
    /// resolved block base) of the packet currently being processed, used
    /// to bound how far behind a block may lag before it's reclaimed.
    fn gc(&mut self, pivot: i32, now: Instant) {
        let ttl = self.ttl;
        let pool = Arc::clone(&self.pool);
        self.blocks.retain(|_, b| {
            let keep = now.duration_since(b.created_at) <= ttl;
            if !keep {
                b.release_into(&pool);
            }
            keep
        });

        let max_age = self.block_stride * self.max_groups as i32;
        self.blocks.retain(|&base, b| {
            let keep = seq::offset(pivot, base) <= max_age;
            if !keep {
                b.release_into(&pool);
            }
            keep
        });

        if let Some(&min_base) = self
            .blocks
            .keys()
            .min_by_key(|&&base| seq::offset(base, self.rcv_base))
        {
            if seq::before(self.rcv_base, min_base) {
                self.rcv_base = min_base;
            }
        }
    }
}
