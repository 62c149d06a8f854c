// Allocation tracking for the bus-side path.
//
// dhat only allows one profiler at a time, so tests here are marked #[serial].
//
// cargo test --test allocation_tracking -- --nocapture

use serial_test::serial;
use slave_mqueue::{BusEvent, QueueBuilder};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[test]
#[serial]
fn steady_state_event_handling_does_not_allocate() {
    let _profiler = dhat::Profiler::builder().testing().build();

    // Setup allocates the arena and the shared state once.
    let (mut producer, consumer) = QueueBuilder::new().with_address(0x10).build().unwrap();
    let mut buf = [0u8; 256];

    // Warm up past the first eviction so lazily registered log callsites are already in place.
    for _ in 0..64 {
        let _ = producer.handle_event(BusEvent::Start { broadcast: false });
        let _ = producer.handle_event(BusEvent::Byte(0));
        let _ = producer.handle_event(BusEvent::Stop);
    }
    let _ = consumer.drain(&mut buf).unwrap();
    let before = dhat::HeapStats::get();

    for n in 0..10_000u32 {
        let _ = producer.handle_event(BusEvent::Start { broadcast: n % 5 == 0 });
        for b in n.to_le_bytes() {
            let _ = producer.handle_event(BusEvent::Byte(b));
        }
        let _ = producer.handle_event(BusEvent::Other);
        let _ = producer.handle_event(BusEvent::Stop);

        if n % 3 == 0 {
            let _ = consumer.drain(&mut buf).unwrap();
        }
    }

    let after = dhat::HeapStats::get();
    println!(
        "setup: {} blocks / {} bytes, steady state: {} new blocks",
        before.total_blocks,
        before.total_bytes,
        after.total_blocks - before.total_blocks
    );
    dhat::assert_eq!(after.total_blocks, before.total_blocks);
    assert_eq!(consumer.stats().finalized, 10_064);
}
