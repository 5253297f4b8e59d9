use position_ledger::orchestration::replay;
use position_ledger::{AppError, Config, CsvSink, MemorySink, SnapshotSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const EVENTS: &str = r#"{"type":"trade","block_height":1,"seq_num":0,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","buyer":"aa01","seller":"aa02","size":2,"price":"1000","position_factor":"1","seller_fee":{"taker_fee":"3"}}
{"type":"settle_position","block_height":1,"seq_num":1,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","party_id":"aa01","price":"1000","position_factor":"1","trades":[{"size":2,"price":"1000"}],"tx_hash":"0x01"}
{"type":"settle_position","block_height":1,"seq_num":2,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","party_id":"aa02","price":"1000","position_factor":"1","trades":[{"size":-2,"price":"1000"}],"tx_hash":"0x02"}
{"type":"trade","block_height":1,"seq_num":3,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","buyer":"aa01","seller":"aa02","size":1,"price":"abc","position_factor":"1"}

{"type":"settle_position","block_height":1,"seq_num":1,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","party_id":"aa01","price":"1000","position_factor":"1","trades":[{"size":2,"price":"1000"}],"tx_hash":"0x01"}
{"type":"settle_market","block_height":2,"seq_num":0,"commit_time":"2024-01-02T03:04:06Z","market_id":"0a0b","settled_price":"1100","position_factor":"1","tx_hash":"0x03"}
garbage
"#;

fn write_events(dir: &Path) -> PathBuf {
    let path = dir.join("events.jsonl");
    std::fs::write(&path, EVENTS).unwrap();
    path
}

fn config(events_path: PathBuf, output_path: Option<PathBuf>) -> Config {
    Config {
        events_path,
        output_path,
        lanes: 2,
        channel_capacity: 4,
        enforce_sequencing: true,
    }
}

#[tokio::test]
async fn test_replay_to_csv() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("positions.csv");
    let config = config(write_events(dir.path()), Some(output.clone()));

    let sink: Arc<dyn SnapshotSink> = Arc::new(CsvSink::create(&output).unwrap());
    let outcome = replay::run(&config, sink).await.unwrap();

    let summary = outcome.summary;
    assert_eq!(summary.lines_read, 7);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.dispatched, 5);
    assert_eq!(summary.broadcasts, 1);
    assert_eq!(summary.applied, 6);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.positions, 2);

    let buyer = &outcome.snapshots[0];
    assert_eq!(buyer.party_id, "aa01");
    assert_eq!(buyer.open_volume, 0);
    assert_eq!(buyer.realised_pnl, "200");
    assert_eq!(buyer.unrealised_pnl, "0");

    let seller = &outcome.snapshots[1];
    assert_eq!(seller.party_id, "aa02");
    assert_eq!(seller.realised_pnl, "-200");
    assert_eq!(seller.taker_fees_paid, "3");

    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("market_id,party_id,commit_time,open_volume"));
}

#[tokio::test]
async fn test_replay_into_memory() {
    let dir = TempDir::new().unwrap();
    let config = config(write_events(dir.path()), None);

    let sink = Arc::new(MemorySink::new());
    let outcome = replay::run(&config, sink.clone()).await.unwrap();

    let rows = sink.rows_for("0a0b", "aa01").await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].pending_open_volume, 2);
    assert_eq!(rows[0].open_volume, 0);
    assert_eq!(rows[1].open_volume, 2);
    assert_eq!(rows[1].tx_hash, "0x01");
    assert_eq!(rows[2].realised_pnl, "200");
    assert_eq!(rows[2].commit_time, "2024-01-02T03:04:06.000000000Z");

    assert_eq!(outcome.positions.len(), 2);
    assert!(outcome.positions.iter().all(|p| p.is_synced()));
}

#[tokio::test]
async fn test_missing_events_file() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path().join("missing.jsonl"), None);

    match replay::run(&config, Arc::new(MemorySink::new())).await {
        Err(AppError::Io(_)) => {}
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_self_trade_line_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    std::fs::write(
        &path,
        r#"{"type":"trade","block_height":1,"seq_num":0,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","buyer":"aa01","seller":"0xAA01","size":2,"price":"1000","position_factor":"1"}
"#,
    )
    .unwrap();

    let sink = Arc::new(MemorySink::new());
    let outcome = replay::run(&config(path, None), sink.clone()).await.unwrap();

    assert_eq!(outcome.summary.rejected, 1);
    assert_eq!(outcome.summary.dispatched, 0);
    assert!(outcome.positions.is_empty());
    assert!(sink.rows().await.is_empty());
}

#[tokio::test]
async fn test_overflowing_settlement_stops_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    std::fs::write(
        &path,
        r#"{"type":"settle_position","block_height":1,"seq_num":0,"commit_time":"2024-01-02T03:04:05Z","market_id":"0a0b","party_id":"aa01","price":"3000000000000000000000","position_factor":"1","trades":[{"size":100000000,"price":"3000000000000000000000"}],"tx_hash":"0x01"}
"#,
    )
    .unwrap();

    match replay::run(&config(path, None), Arc::new(MemorySink::new())).await {
        Err(err) => assert!(err.is_fatal(), "expected fatal error, got {err:?}"),
        Ok(outcome) => panic!("expected fatal error, got {:?}", outcome.summary),
    }
}
