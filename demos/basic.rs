use chrono::Local;
use intervaq::{Scheduler, Ticker, TokioClock};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 Repeating and one-shot tasks on a 16ms ticker...\n");

    let scheduler = Scheduler::with_clock(TokioClock::new());
    let counter = Arc::new(AtomicU32::new(0));

    let fast = counter.clone();
    scheduler.create_repeating(
        move || {
            let count = fast.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Local::now().format("%H:%M:%S%.3f");
            println!("[{}] [FAST] Execution #{} (every 500ms)", now, count);
        },
        500.0,
    )?;

    scheduler.create_one_shot(
        || {
            let now = Local::now().format("%H:%M:%S%.3f");
            println!("[{}] [ONCE] Fired after 2s, then gone", now);
        },
        2_000.0,
    )?;

    let ticker = Ticker::new(scheduler.clone(), Duration::from_millis(16)).spawn();

    tokio::time::sleep(Duration::from_secs(5)).await;
    ticker.shutdown().await;

    println!("\n📊 RESULTS after 5 seconds:");
    println!("   Repeating task: {} executions (expected ~10)", counter.load(Ordering::SeqCst));
    println!("   Tasks left registered: {}", scheduler.len());

    Ok(())
}
