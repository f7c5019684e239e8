use chrono::Local;
use intervaq::{SchedulerBuilder, Ticker, TokioClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_target(false)
        .init();

    println!("📝 Configuration: demos/config/application.toml");
    println!("   - scheduler.tick_rate: driver poll rate");
    println!("   - app.heartbeat: heartbeat interval");
    println!("   - app.splash: one-shot delay (falls back to 3s)\n");

    let scheduler = SchedulerBuilder::with_toml("demos/config/application.toml")?
        .clock(TokioClock::new())
        .build()?;

    scheduler.create_repeating_from(
        || {
            let now = Local::now().format("%H:%M:%S%.3f");
            println!("[{}] 💓 [HEARTBEAT] interval from config", now);
        },
        "${app.heartbeat}",
    )?;

    scheduler.create_one_shot_from(
        || {
            let now = Local::now().format("%H:%M:%S%.3f");
            println!("[{}] 🎬 [SPLASH] one-shot with delay from config", now);
        },
        "${app.splash:3s}",
    )?;

    let ticker = Ticker::from_config(scheduler.clone())?;
    println!("✅ Polling every {:?}. Press Ctrl+C to stop.\n", ticker.rate());
    let handle = ticker.spawn();

    tokio::signal::ctrl_c().await?;

    println!("\n👋 Shutting down...");
    handle.shutdown().await;
    scheduler.clear();
    Ok(())
}
