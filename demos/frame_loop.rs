//! Drives a scheduler from simulated 60fps frame timestamps, the way a
//! render loop hands its frame time to `poll`. A "menu" pauses the game
//! clock for 90 frames in the middle.

use intervaq::{ManualClock, Scheduler};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const FRAME_MS: f64 = 1000.0 / 60.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = ManualClock::new(0.0);
    let scheduler = Scheduler::with_clock(clock.clone());

    let spawned = Arc::new(AtomicU32::new(0));
    let counter = spawned.clone();
    let spawner = scheduler.create_repeating(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        500.0,
    )?;

    let boss = scheduler.create_one_shot(|| println!("👾 Boss arrives!"), 4_000.0)?;

    for frame in 0..360u32 {
        let timestamp = clock.advance(FRAME_MS);

        match frame {
            120 => {
                scheduler.pause_all();
                println!("⏸️  Menu opened at {:.1}ms", timestamp);
            }
            210 => {
                scheduler.resume_all();
                println!("▶️  Menu closed at {:.1}ms", timestamp);
            }
            _ => {}
        }

        scheduler.poll(timestamp)?;
    }

    println!("\n📊 After 6s of frames (1.5s of them paused):");
    println!("   Enemies spawned: {} (expected ~9)", spawned.load(Ordering::SeqCst));
    println!("   Next spawn at: {:.1}ms", spawner.next_fire_at());
    println!("   Boss still pending: {}", scheduler.contains(&boss));

    Ok(())
}
