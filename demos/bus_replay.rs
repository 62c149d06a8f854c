// Simulated bus traffic into a slave queue, drained by a blocking reader.
//
// cargo run --example bus_replay -- [messages] [--dump]
// RUST_LOG=slave_mqueue=debug cargo run --example bus_replay -- 500 --dump

use slave_mqueue::Debug::DumpConfig;
use slave_mqueue::{BusEvent, MqueueError, QueueBuilder};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BUS_ID: i32 = 1;
const ADDRESS: u16 = 0x13;

fn main() -> Result<(), MqueueError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let messages: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let dump = Arc::new(DumpConfig::new(args.iter().any(|a| a == "--dump"), BUS_ID));

    let (mut producer, consumer) = QueueBuilder::new()
        .with_bus_id(BUS_ID)
        .with_address(ADDRESS)
        .with_dump(dump)
        .build()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_for_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let bus_running = Arc::clone(&running);
    let bus = thread::spawn(move || {
        let mut rng = fastrand::Rng::with_seed(0x5EED);
        for n in 0..messages {
            if !bus_running.load(Ordering::SeqCst) {
                break;
            }

            let broadcast = n % 10 == 0;
            let _ = producer.handle_event(BusEvent::Start { broadcast });
            // Every so often the master sends more than we can hold.
            let len = if n % 37 == 36 { 300 } else { rng.usize(1..24) };
            // Overflow bytes come back Truncated; a real controller would NAK them.
            for i in 0..len {
                let _ = producer.handle_event(BusEvent::Byte(i as u8));
            }
            let _ = producer.handle_event(BusEvent::Stop);

            thread::sleep(Duration::from_micros(rng.u64(50..500)));
        }
        info!("bus finished");
        // Dropping the producer disconnects the reader once it has drained the rest.
    });

    let mut received = 0usize;
    loop {
        match consumer.receive_blocking() {
            Ok(msg) => {
                received += 1;
                if received % 25 == 0 {
                    info!(received, len = msg.len(), "reader progress");
                }
            }
            Err(MqueueError::Disconnected) => break,
            Err(e) => {
                warn!(error = %e, "read failed");
                break;
            }
        }
    }

    bus.join().expect("bus thread panicked");
    let stats = consumer.stats();
    info!(
        received,
        finalized = stats.finalized,
        evicted = stats.evicted,
        truncated = stats.truncated,
        "done"
    );
    Ok(())
}
