//! Blocking wait example
//!
//! Demonstrates wait(): a dedicated render thread keeps draining the
//! scheduler while another thread blocks until its transfer settles.

use readback::{AsyncReadback, CallbackQueue, DummyBackend, ReadbackConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    let backend = Arc::new(DummyBackend::new());
    backend.set_fence_latency(5);
    let texture = backend.add_texture(16, 16, 1, 4, &[128u8; 1024]);

    let readback = AsyncReadback::new(backend.clone(), ReadbackConfig::default());
    let queue = CallbackQueue::new();
    readback.set_scheduler(queue.clone());

    println!("=== Blocking Wait Demo ===\n");

    // Render thread: drains scheduled callbacks until told to stop.
    let stop = Arc::new(AtomicBool::new(false));
    let render_thread = {
        let queue = queue.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                if queue.run_pending() == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        })
    };

    let request = readback.create_texture_transfer(texture, 0);
    println!("waiting for request {} ...", request.id());
    request.wait();
    println!(
        "settled: done = {}, error = {}",
        request.done(),
        request.has_error()
    );
    if let Some(len) = request.with_data(|bytes| bytes.len()) {
        println!("read {} bytes", len);
    }

    // wait() leaves the entry alive; two update cycles dispose it.
    readback.update_once();
    readback.update_once();
    println!("disposed: {}", !request.exists());

    stop.store(true, Ordering::Relaxed);
    render_thread.join().expect("render thread panicked");

    println!("\n{}", readback.stats());
}
