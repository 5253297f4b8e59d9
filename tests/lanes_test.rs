use position_ledger::domain::{
    MarketEnvelope, PositionSettlement, SettleMarket, Trade, TradeSettlement,
};
use position_ledger::orchestration::LaneError;
use position_ledger::{
    CommitTime, ConfirmedEvent, Decimal, EventEnvelope, EventSequence, InvariantViolation,
    LaneRouter, MarketId, MemorySink, PartyId, Position, PositionEvent, PositionKey, PositionRow,
    TxHash,
};
use std::sync::Arc;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn key(market: &str, party: &str) -> PositionKey {
    PositionKey::new(
        MarketId::new(market.to_string()),
        PartyId::new(party.to_string()),
    )
}

fn buy(key: PositionKey, block: u64, size: i64, price: &str) -> EventEnvelope {
    EventEnvelope {
        key,
        sequence: EventSequence::new(block, 0),
        commit_time: CommitTime::from_unix_nanos(block as i64 * 1_000_000_000),
        event: PositionEvent::Trade {
            trade: Trade::new(size, d(price)),
            seller: false,
            position_factor: Decimal::one(),
        },
    }
}

fn settle(key: PositionKey, block: u64, price: &str, trades: &[(i64, &str)]) -> EventEnvelope {
    EventEnvelope {
        key,
        sequence: EventSequence::new(block, 1),
        commit_time: CommitTime::from_unix_nanos(block as i64 * 1_000_000_000),
        event: PositionEvent::Confirmed(ConfirmedEvent::PositionSettlement(PositionSettlement {
            price: d(price),
            position_factor: Decimal::one(),
            trades: trades
                .iter()
                .map(|(size, px)| TradeSettlement::new(*size, d(px)))
                .collect(),
            tx_hash: TxHash::default(),
        })),
    }
}

#[tokio::test]
async fn test_events_are_applied_per_key_across_lanes() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(4, 8, sink.clone(), true);

    let parties: Vec<String> = (1..=16).map(|i| format!("{:04x}", i)).collect();
    for (i, party) in parties.iter().enumerate() {
        let k = key("0a0b", party);
        router.dispatch(buy(k.clone(), 1, i as i64 + 1, "100")).await.unwrap();
        router.dispatch(buy(k, 2, 1, "200")).await.unwrap();
    }

    let report = router.shutdown().await.unwrap();
    assert_eq!(report.positions.len(), 16);
    assert_eq!(report.stats.applied, 32);
    assert_eq!(report.stats.skipped, 0);

    for (i, position) in report.positions.iter().enumerate() {
        assert_eq!(position.party_id.as_str(), parties[i]);
        assert_eq!(position.provisional.open_volume, i as i64 + 2);
        assert_eq!(position.commit_time, CommitTime::from_unix_nanos(2_000_000_000));
    }

    // One row per applied event, in order for each key.
    let rows = sink.rows_for("0a0b", &parties[3]).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].pending_open_volume, 4);
    assert_eq!(rows[1].pending_open_volume, 5);
}

#[tokio::test]
async fn test_same_key_always_routes_to_same_lane() {
    let router = LaneRouter::spawn(8, 1, Arc::new(MemorySink::new()), false);
    let k = key("0a0b", "beef");
    let lane = router.lane_for(&k);
    for _ in 0..10 {
        assert_eq!(router.lane_for(&k), lane);
    }
    assert!(lane < router.lane_count());
    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sequencing_guard_drops_replayed_events() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(2, 8, sink.clone(), true);
    let k = key("0a0b", "beef");

    router.dispatch(buy(k.clone(), 5, 2, "100")).await.unwrap();
    router.dispatch(buy(k.clone(), 5, 2, "100")).await.unwrap();
    router.dispatch(buy(k.clone(), 4, 2, "100")).await.unwrap();
    router.dispatch(buy(k, 6, 1, "100")).await.unwrap();

    let report = router.shutdown().await.unwrap();
    assert_eq!(report.stats.applied, 2);
    assert_eq!(report.stats.skipped, 2);
    assert_eq!(report.positions[0].provisional.open_volume, 3);
    assert_eq!(sink.rows().await.len(), 2);
}

#[tokio::test]
async fn test_without_guard_duplicates_are_applied() {
    let router = LaneRouter::spawn(2, 8, Arc::new(MemorySink::new()), false);
    let k = key("0a0b", "beef");

    router.dispatch(buy(k.clone(), 5, 2, "100")).await.unwrap();
    router.dispatch(buy(k, 5, 2, "100")).await.unwrap();

    let report = router.shutdown().await.unwrap();
    assert_eq!(report.stats.applied, 2);
    assert_eq!(report.positions[0].provisional.open_volume, 4);
}

#[tokio::test]
async fn test_market_wide_settlement_reaches_only_that_market() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(3, 8, sink.clone(), true);

    for party in ["aa01", "aa02", "aa03"] {
        router
            .dispatch(settle(key("0a0b", party), 1, "1000", &[(2, "1000")]))
            .await
            .unwrap();
    }
    router
        .dispatch(settle(key("0c0d", "aa01"), 1, "1000", &[(2, "1000")]))
        .await
        .unwrap();

    router
        .broadcast(MarketEnvelope {
            market_id: MarketId::new("0a0b".to_string()),
            sequence: EventSequence::new(2, 0),
            commit_time: CommitTime::from_unix_nanos(2_000_000_000),
            event: PositionEvent::Confirmed(ConfirmedEvent::SettleMarket(SettleMarket {
                settled_price: d("1100"),
                position_factor: Decimal::one(),
                tx_hash: TxHash::new("0xfe".to_string()),
            })),
        })
        .await
        .unwrap();

    let report = router.shutdown().await.unwrap();
    assert_eq!(report.positions.len(), 4);
    for position in &report.positions {
        if position.market_id.as_str() == "0a0b" {
            assert_eq!(position.confirmed.open_volume, 0);
            assert_eq!(position.confirmed.realised_pnl, d("200"));
            assert_eq!(position.tx_hash.as_str(), "0xfe");
        } else {
            assert_eq!(position.confirmed.open_volume, 2);
            assert_eq!(position.confirmed.realised_pnl, Decimal::zero());
        }
    }
    assert_eq!(report.stats.applied, 7);
}

#[tokio::test]
async fn test_invariant_violation_halts_lane() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(1, 8, sink.clone(), true);
    let k = key("0a0b", "beef");

    router.dispatch(buy(k.clone(), 1, 1, "100")).await.unwrap();
    router
        .dispatch(settle(k.clone(), 2, "5", &[(1, "-5")]))
        .await
        .unwrap();

    match router.shutdown().await {
        Err(err @ LaneError::Fatal { .. }) => {
            assert!(err.is_fatal());
            if let LaneError::Fatal { key, sequence, .. } = err {
                assert_eq!(key, k);
                assert_eq!(sequence, EventSequence::new(2, 1));
            }
        }
        other => panic!("expected fatal lane error, got {other:?}"),
    }

    // The violating update never reached the sink.
    let rows = sink.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pending_open_volume, 1);
}

const HUGE_PRICE: &str = "3000000000000000000000";

#[tokio::test]
async fn test_overflow_halts_lane_and_keeps_last_good_state() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(1, 8, sink.clone(), true);
    let k = key("0a0b", "beef");

    router.dispatch(buy(k.clone(), 1, 2, "1000")).await.unwrap();
    router
        .dispatch(settle(k.clone(), 1, "1000", &[(2, "1000")]))
        .await
        .unwrap();
    router
        .dispatch(settle(k.clone(), 2, HUGE_PRICE, &[(100_000_000, HUGE_PRICE)]))
        .await
        .unwrap();
    // The lane may already be closed by the time this is sent.
    let _ = router.dispatch(buy(k.clone(), 3, 1, "1000")).await;

    match router.shutdown().await {
        Err(err @ LaneError::Fatal { .. }) => {
            assert!(err.is_fatal());
            if let LaneError::Fatal {
                key,
                sequence,
                violation,
                ..
            } = err
            {
                assert_eq!(key, k);
                assert_eq!(sequence, EventSequence::new(2, 1));
                assert_eq!(
                    violation,
                    InvariantViolation::Overflow {
                        op: "average_entry_price"
                    }
                );
            }
        }
        other => panic!("expected fatal lane error, got {other:?}"),
    }

    let mut expected = Position::new_empty(k.market_id.clone(), k.party_id.clone());
    expected.stamp(CommitTime::from_unix_nanos(1_000_000_000));
    expected
        .update_with_trade(&Trade::new(2, d("1000")), false, Decimal::one())
        .unwrap();
    expected
        .update_with_position_settlement(&PositionSettlement {
            price: d("1000"),
            position_factor: Decimal::one(),
            trades: vec![TradeSettlement::new(2, d("1000"))],
            tx_hash: TxHash::default(),
        })
        .unwrap();

    let rows = sink.rows().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], PositionRow::from_position(&expected));
    assert_eq!(rows[1].open_volume, 2);
    assert_eq!(rows[1].average_entry_price, "1000");
}

#[tokio::test]
async fn test_overflow_on_one_lane_is_reported_over_clean_lanes() {
    let sink = Arc::new(MemorySink::new());
    let router = LaneRouter::spawn(4, 8, sink.clone(), true);
    let bad = key("0a0b", "beef");

    for i in 1..=8u32 {
        let k = key("0a0b", &format!("{:04x}", i));
        router.dispatch(buy(k, 1, 1, "100")).await.unwrap();
    }
    router
        .dispatch(buy(bad.clone(), 1, 100_000_000, HUGE_PRICE))
        .await
        .unwrap();

    match router.shutdown().await {
        Err(LaneError::Fatal { key, violation, .. }) => {
            assert_eq!(key, bad);
            assert!(matches!(violation, InvariantViolation::Overflow { .. }));
        }
        other => panic!("expected fatal lane error, got {other:?}"),
    }
    assert!(sink.rows_for("0a0b", "beef").await.is_empty());
}
