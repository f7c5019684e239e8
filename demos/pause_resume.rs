use chrono::Local;
use intervaq::{Scheduler, Ticker, TokioClock};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .with_target(false)
        .init();

    let scheduler = Scheduler::with_clock(TokioClock::new());

    let every_second = scheduler.create_repeating(
        || {
            let now = Local::now().format("%H:%M:%S%.3f");
            println!("[{}] ⏱️  [TICK] every second of unpaused time", now);
        },
        1_000.0,
    )?;

    let ticker = Ticker::new(scheduler.clone(), Duration::from_millis(16)).spawn();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let before = every_second.next_fire_at();
    scheduler.pause_all();
    println!("\n⏸️  Paused at {:.1}ms, next tick was due at {:.1}ms", scheduler.now(), before);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let paused_at = scheduler.paused_at().unwrap_or_default();
    scheduler.resume_all();
    let after = every_second.next_fire_at();
    println!(
        "▶️  Resumed after {:.1}ms, next tick moved to {:.1}ms (+{:.1}ms)\n",
        scheduler.now() - paused_at,
        after,
        after - before
    );

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    ticker.shutdown().await;

    println!("\n👋 Done, {} ticks fired in total", every_second.fire_count());
    Ok(())
}
