use collector_buffer::{BufferManager, EventSink, LogRecord, Severity};
use std::sync::Arc;
use std::time::Duration;

// Small end-to-end wiring: one producer task feeding the buffer through the
// EventSink seam, two handlers draining it at different paces.
#[tokio::main]
async fn main() {
    env_logger::init();

    let manager = BufferManager::<LogRecord>::new(100).expect("capacity is non-zero");
    manager.add_handler("console").await.expect("fresh id");
    manager.add_handler("jsonl").await.expect("fresh id");

    let producer: Arc<dyn EventSink<LogRecord>> = manager.clone();
    let produce = tokio::spawn(async move {
        for i in 0..20 {
            let severity = if i % 5 == 0 {
                Severity::Warning
            } else {
                Severity::Info
            };
            let record = LogRecord::new(severity, "demo-source", format!("message #{i}"));
            producer.add(record).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    // One-at-a-time consumer.
    let console = manager.clone();
    let console_task = tokio::spawn(async move {
        for _ in 0..20 {
            let record = console.next_event("console").await.expect("registered");
            println!("[console] {:?} {}: {}", record.severity, record.source, record.message);
        }
    });

    // Batch consumer, serializing each batch to JSONL.
    let jsonl = manager.clone();
    let jsonl_task = tokio::spawn(async move {
        let mut seen = 0;
        while seen < 20 {
            let batch = jsonl.next_events("jsonl", 8).await.expect("registered");
            seen += batch.len();
            for record in &batch {
                let line = serde_json::to_string(record).expect("record serializes");
                println!("[jsonl] {line}");
            }
        }
    });

    produce.await.expect("producer task");
    console_task.await.expect("console task");
    jsonl_task.await.expect("jsonl task");

    manager.remove_handler("console").await;
    manager.remove_handler("jsonl").await;
}
