//! Tick Pipeline Integration Tests
//!
//! Exercises the full decode -> resolve -> store -> broadcast path through
//! the public API, without a network transport.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use feed_bridge::infrastructure::feed::codec;
use feed_bridge::{
    Broadcaster, ExchangeSegment, FeedClient, FeedClientConfig, FeedStatus, Instrument,
    InstrumentTable, StreamEvent, TickStore,
    infrastructure::feed::messages::FeedRequest,
};

fn catalogue(count: usize) -> Vec<Instrument> {
    (0..count)
        .map(|i| Instrument {
            symbol: format!("SYM{i}"),
            exchange_segment: if i % 2 == 0 {
                ExchangeSegment::Equity
            } else {
                ExchangeSegment::Derivative
            },
            security_id: (1000 + i).to_string(),
        })
        .collect()
}

fn tick_frame(kind: u8, security_id: u32, price: f32, epoch: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 16];
    buf[0] = kind;
    buf[4..8].copy_from_slice(&security_id.to_le_bytes());
    buf[8..12].copy_from_slice(&price.to_le_bytes());
    buf[12..16].copy_from_slice(&epoch.to_le_bytes());
    buf
}

fn build_pipeline(
    instruments: Vec<Instrument>,
) -> (Arc<FeedClient>, Arc<TickStore>, Arc<Broadcaster>) {
    let table = Arc::new(InstrumentTable::new(instruments).unwrap());
    let store = Arc::new(TickStore::new());
    let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&store)));
    let client = Arc::new(FeedClient::new(
        FeedClientConfig::new("ws://127.0.0.1:1/unused".to_string()),
        table,
        Arc::clone(&store),
        Arc::clone(&broadcaster),
        Arc::new(FeedStatus::new()),
        CancellationToken::new(),
    ));
    (client, store, broadcaster)
}

#[test]
fn subscription_sequence_covers_full_catalogue() {
    let instruments = catalogue(220);
    let requests = codec::subscription_requests(&instruments);

    // 220 instruments -> 100 + 100 + 20, then exactly one mode-set.
    let mut batch_sizes = Vec::new();
    let mut mode_count = 0;
    for request in &requests {
        match request {
            FeedRequest::Subscribe(s) => batch_sizes.push(s.instrument_count),
            FeedRequest::Mode(m) => {
                mode_count += 1;
                assert_eq!(m.request_code, 16);
                assert_eq!(m.mode, 1);
            }
        }
    }
    assert_eq!(batch_sizes, vec![100, 100, 20]);
    assert_eq!(mode_count, 1);

    // Every message serializes to the documented wire shape.
    let first = requests[0].to_json().unwrap();
    assert!(first.starts_with(r#"{"RequestCode":15,"InstrumentCount":100,"#));
}

#[test]
fn ticks_flow_from_frames_to_subscribers() {
    let (client, store, broadcaster) = build_pipeline(catalogue(3));
    let (tx, mut rx) = mpsc::channel(64);
    let _sub = broadcaster.subscribe(Box::new(tx));

    client.handle_frame(&tick_frame(0x02, 1000, 99.5, 1_700_000_000));
    client.handle_frame(&tick_frame(0x06, 1001, 45.25, 1_700_000_001));

    assert_eq!(rx.try_recv().unwrap(), StreamEvent::Initial(vec![]));

    let StreamEvent::Tick(first) = rx.try_recv().unwrap() else {
        panic!("expected tick");
    };
    assert_eq!(first.symbol, "SYM0");

    let StreamEvent::Tick(second) = rx.try_recv().unwrap() else {
        panic!("expected tick");
    };
    assert_eq!(second.symbol, "SYM1");
    assert_eq!(second.kind.label(), "QUOTE");

    assert_eq!(store.len(), 2);
}

#[test]
fn late_subscriber_seeds_from_snapshot() {
    let (client, _store, broadcaster) = build_pipeline(catalogue(2));

    client.handle_frame(&tick_frame(0x02, 1000, 10.0, 1_700_000_000));
    client.handle_frame(&tick_frame(0x02, 1001, 20.0, 1_700_000_001));
    client.handle_frame(&tick_frame(0x02, 1000, 11.0, 1_700_000_002));

    let (tx, mut rx) = mpsc::channel(64);
    let _sub = broadcaster.subscribe(Box::new(tx));

    let StreamEvent::Initial(mut snapshot) = rx.try_recv().unwrap() else {
        panic!("expected initial");
    };
    snapshot.sort_by_key(|r| r.security_id);

    // Snapshot carries the latest value per id, last write wins.
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].price, 11.0);
    assert_eq!(snapshot[1].price, 20.0);
}

#[test]
fn unsubscribed_consumer_stops_receiving() {
    let (client, _store, broadcaster) = build_pipeline(catalogue(1));

    let (tx, mut rx) = mpsc::channel(64);
    let sub = broadcaster.subscribe(Box::new(tx));
    let _ = rx.try_recv().unwrap(); // initial

    client.handle_frame(&tick_frame(0x02, 1000, 1.0, 1_700_000_000));
    assert!(matches!(rx.try_recv().unwrap(), StreamEvent::Tick(_)));

    broadcaster.unsubscribe(sub);
    client.handle_frame(&tick_frame(0x02, 1000, 2.0, 1_700_000_001));
    assert!(rx.try_recv().is_err());

    // Idempotent removal.
    broadcaster.unsubscribe(sub);
}

#[test]
fn malformed_frames_do_not_disturb_the_stream() {
    let (client, store, broadcaster) = build_pipeline(catalogue(1));
    let (tx, mut rx) = mpsc::channel(64);
    let _sub = broadcaster.subscribe(Box::new(tx));
    let _ = rx.try_recv().unwrap(); // initial

    client.handle_frame(&[0xff; 15]);
    client.handle_frame(&tick_frame(0x02, 1000, 5.0, 1_700_000_000));
    client.handle_frame(&[]);

    assert!(matches!(rx.try_recv().unwrap(), StreamEvent::Tick(_)));
    assert!(rx.try_recv().is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(client.status().frames_dropped(), 2);
    assert_eq!(client.status().messages_received(), 1);
}
