//! The packet-filter facade (§4.6): the only type the surrounding transport
//! talks to. Construction validates the configuration string and builds the
//! shared codec; afterwards `feed_source`/`pack_control` drive the send
//! path and `receive` drives the receive path, each under its own lock so
//! the two sides never contend (§5).

use crate::config::FilterConfig;
use crate::error::ConfigError;
use crate::gf;
use crate::packet::{ControlPacket, SourcePacket};
use crate::receiver::{BlockTracker, ProvidedQueue};
use crate::rs::RsCodec;
use crate::sender::BlockAssembler;
use crate::wire::{self, ParityHeader};
use log::warn;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default cap on concurrently tracked receive blocks (§3).
pub const DEFAULT_MAX_GROUPS: usize = 64;
/// Default block eviction deadline (§3).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// The retransmission policy this filter asks the surrounding ARQ layer
/// for (§4.6). RS-FEC recovers losses on its own, so it only ever asks
/// for at most one retransmission request per lost packet (in case it
/// turns out to be unrecoverable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqLevel {
    AtMostOnRequest,
}

/// An inbound packet, already classified by the transport into "source
/// data" or "control" (§4.5) before it reaches `receive`.
pub enum Inbound<'a> {
    Source(SourcePacket),
    Control(&'a [u8]),
}

pub struct RsFecFilter {
    config: FilterConfig,
    shard_len: usize,
    codec: Arc<RsCodec>,
    sender: Mutex<BlockAssembler>,
    tracker: Mutex<BlockTracker>,
    provided: Arc<ProvidedQueue>,
}

impl RsFecFilter {
    /// Parses `config_str` (§6) and builds a filter instance bound to a
    /// single connection's shard size `shard_len` and initial sequence
    /// number `isn`. The transport is assumed to have negotiated both
    /// out of band; this filter has no way to learn them on its own.
    pub fn new(
        config_str: &str,
        shard_len: usize,
        isn: i32,
        max_groups: usize,
        ttl: Duration,
        provided: Arc<ProvidedQueue>,
    ) -> Result<Self, ConfigError> {
        let config = FilterConfig::parse(config_str)?;
        gf::init();
        let codec = Arc::new(RsCodec::new(config.k, config.m));
        let sender = BlockAssembler::with_timeout(Arc::clone(&codec), shard_len, config.timeout);
        let tracker = BlockTracker::new(Arc::clone(&codec), shard_len, isn, max_groups, ttl);

        Ok(Self {
            config,
            shard_len,
            codec,
            sender: Mutex::new(sender),
            tracker: Mutex::new(tracker),
            provided,
        })
    }

    /// Convenience constructor using the §3 default bounds.
    pub fn with_defaults(
        config_str: &str,
        shard_len: usize,
        isn: i32,
        provided: Arc<ProvidedQueue>,
    ) -> Result<Self, ConfigError> {
        Self::new(config_str, shard_len, isn, DEFAULT_MAX_GROUPS, DEFAULT_TTL, provided)
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// §4.3 send path: buffer a freshly transmitted source packet.
    pub fn feed_source(&self, pkt: &SourcePacket) {
        self.sender.lock().unwrap().feed_source(pkt);
    }

    /// §4.3 send path: poll for the next pending parity control packet.
    pub fn pack_control(&self, out: &mut ControlPacket) -> bool {
        self.sender.lock().unwrap().pack_control(out)
    }

    /// §4.4/§4.5 receive path. Returns whether `pkt` should still be passed
    /// through to the application (`true`) or has been fully consumed by
    /// the filter (`false`).
    pub fn receive(&self, pkt: Inbound) -> bool {
        match pkt {
            Inbound::Source(sp) => {
                self.tracker.lock().unwrap().on_source(sp, &self.provided);
                true
            }
            Inbound::Control(buf) => match ParityHeader::parse(buf) {
                None => true,
                Some(header) => {
                    if header.k as usize != self.codec.k() {
                        warn!(
                            "fec: parity packet k mismatch (got {}, configured {})",
                            header.k,
                            self.codec.k()
                        );
                        return false;
                    }
                    if buf.len() < wire::HEADER_LEN + self.shard_len {
                        warn!("fec: parity packet shorter than configured shard length");
                        return false;
                    }
                    let payload = &buf[wire::HEADER_LEN..wire::HEADER_LEN + self.shard_len];
                    self.tracker.lock().unwrap().on_parity(
                        header.block_seq,
                        header.parity_index as usize,
                        payload,
                        &self.provided,
                    );
                    false
                }
            },
        }
    }

    /// §4.6: RS-FEC never needs more than one retransmission request per
    /// lost packet.
    pub fn arq_level(&self) -> ArqLevel {
        ArqLevel::AtMostOnRequest
    }

    /// §4.6: fixed 8-byte parity header overhead, regardless of `k`/`m`.
    pub fn extra_size(&self) -> usize {
        wire::HEADER_LEN
    }

    /// Drains every packet the decoder has reconstructed so far.
    pub fn drain_provided(&self) -> Vec<crate::packet::RebuiltPacket> {
        self.provided.drain()
    }
}
