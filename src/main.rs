use position_ledger::orchestration::replay;
use position_ledger::{config::Config, CsvSink, MemorySink, SnapshotSink};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let sink: Arc<dyn SnapshotSink> = match &config.output_path {
        Some(path) => match CsvSink::create(path) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                eprintln!("Failed to open output {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Arc::new(MemorySink::new()),
    };

    let outcome = match replay::run(&config, sink).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_fatal() {
                tracing::error!("Halted on invariant violation: {}", e);
            }
            eprintln!("Replay failed: {}", e);
            std::process::exit(1);
        }
    };

    for snapshot in &outcome.snapshots {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Failed to render snapshot: {}", e);
                std::process::exit(1);
            }
        }
    }
}
