use rsfec::{ControlPacket, Inbound, ProvidedQueue, RsFecFilter, SourcePacket};
use std::sync::Arc;

const ISN: i32 = 1000;
const SHARD_LEN: usize = 1316;

fn init() {
    let _ = env_logger::try_init();
}

fn payload(byte: u8) -> Vec<u8> {
    vec![byte; SHARD_LEN]
}

fn new_filter(config: &str) -> RsFecFilter {
    RsFecFilter::with_defaults(config, SHARD_LEN, ISN, Arc::new(ProvidedQueue::new())).unwrap()
}

/// Feeds `k` source packets through the sender side and drains every
/// parity packet `pack_control` hands back.
fn encode_block(filter: &RsFecFilter, base_seq: i32, k: usize) -> (Vec<SourcePacket>, Vec<Vec<u8>>) {
    let sources: Vec<SourcePacket> = (0..k)
        .map(|i| SourcePacket { seq: base_seq + i as i32, timestamp: 1, payload: payload(i as u8 + 1) })
        .collect();
    for s in &sources {
        filter.feed_source(s);
    }

    let mut parity = Vec::new();
    loop {
        let mut buf = vec![0u8; SHARD_LEN + 8];
        let mut out = ControlPacket { buffer: &mut buf, length: 0 };
        if !filter.pack_control(&mut out) {
            break;
        }
        buf.truncate(out.length);
        parity.push(buf);
    }
    (sources, parity)
}

#[test]
fn s1_single_loss_recovery() {
    init();
    let filter = new_filter("k=4,m=2");
    let (sources, parity) = encode_block(&filter, ISN, 4);
    assert_eq!(parity.len(), 2);

    for (i, s) in sources.iter().enumerate() {
        if i == 2 {
            continue;
        }
        assert!(filter.receive(Inbound::Source(s.clone())));
    }
    for p in &parity {
        assert!(!filter.receive(Inbound::Control(p)));
    }

    let recovered = filter.drain_provided();
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].seq, ISN + 2);
    assert_eq!(recovered[0].payload.len(), SHARD_LEN);
    assert!(recovered[0].payload.iter().all(|&b| b == 0x03));
}

#[test]
fn s2_double_loss_recovery() {
    init();
    let filter = new_filter("k=4,m=2");
    let (sources, parity) = encode_block(&filter, ISN, 4);

    for idx in [0usize, 2] {
        assert!(filter.receive(Inbound::Source(sources[idx].clone())));
    }
    for p in &parity {
        assert!(!filter.receive(Inbound::Control(p)));
    }

    let mut recovered = filter.drain_provided();
    recovered.sort_by_key(|p| p.seq);
    assert_eq!(recovered.len(), 2);
    assert_eq!(recovered[0].seq, ISN + 1);
    assert_eq!(recovered[0].payload, sources[1].payload);
    assert_eq!(recovered[1].seq, ISN + 3);
    assert_eq!(recovered[1].payload, sources[3].payload);
}

#[test]
fn s3_unordered_double_loss_matches_s2() {
    init();
    let filter = new_filter("k=4,m=2");
    let (sources, parity) = encode_block(&filter, ISN, 4);

    // Parity arrives before the remaining source data.
    assert!(!filter.receive(Inbound::Control(&parity[0])));
    assert!(!filter.receive(Inbound::Control(&parity[1])));
    assert!(filter.receive(Inbound::Source(sources[2].clone())));
    assert!(filter.receive(Inbound::Source(sources[0].clone())));

    let mut recovered = filter.drain_provided();
    recovered.sort_by_key(|p| p.seq);
    assert_eq!(recovered.len(), 2);
    assert_eq!(recovered[0].seq, ISN + 1);
    assert_eq!(recovered[0].payload, sources[1].payload);
    assert_eq!(recovered[1].seq, ISN + 3);
    assert_eq!(recovered[1].payload, sources[3].payload);
}

#[test]
fn s4_over_capacity_yields_nothing() {
    init();
    let filter = new_filter("k=4,m=2");
    let (sources, parity) = encode_block(&filter, ISN, 4);

    assert!(filter.receive(Inbound::Source(sources[3].clone())));
    for p in &parity {
        assert!(!filter.receive(Inbound::Control(p)));
    }

    assert!(filter.drain_provided().is_empty());
}

#[test]
fn s5_two_interleaved_blocks() {
    init();
    let filter = new_filter("k=4,m=2");
    let (sources_a, parity_a) = encode_block(&filter, ISN, 4);
    let (sources_b, parity_b) = encode_block(&filter, ISN + 4, 4);

    // Shuffled delivery across both blocks, dropping index 1 of block A
    // and index 1 of block B (global sequence isn+1 and isn+5).
    assert!(filter.receive(Inbound::Source(sources_a[0].clone())));
    assert!(filter.receive(Inbound::Source(sources_b[0].clone())));
    assert!(!filter.receive(Inbound::Control(&parity_b[0])));
    assert!(filter.receive(Inbound::Source(sources_a[2].clone())));
    assert!(!filter.receive(Inbound::Control(&parity_a[0])));
    assert!(filter.receive(Inbound::Source(sources_b[2].clone())));
    assert!(filter.receive(Inbound::Source(sources_b[3].clone())));
    assert!(!filter.receive(Inbound::Control(&parity_b[1])));
    assert!(filter.receive(Inbound::Source(sources_a[3].clone())));
    assert!(!filter.receive(Inbound::Control(&parity_a[1])));

    let mut recovered = filter.drain_provided();
    recovered.sort_by_key(|p| p.seq);
    assert_eq!(recovered.len(), 2);
    assert_eq!(recovered[0].seq, ISN + 1);
    assert_eq!(recovered[1].seq, ISN + 5);
}

#[test]
fn s6_config_rejection() {
    init();
    let err = RsFecFilter::with_defaults("k=200,m=100", SHARD_LEN, ISN, Arc::new(ProvidedQueue::new()))
        .unwrap_err();
    assert_eq!(err, rsfec::ConfigError::SumTooLarge { sum: 300 });
}
