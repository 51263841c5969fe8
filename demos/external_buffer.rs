//! External buffer example
//!
//! Demonstrates readback into caller-owned memory: the registry writes
//! straight into your allocation with no copy on read, including what
//! happens when the destination is smaller than the texture.

use readback::{AsyncReadback, CallbackQueue, DummyBackend, ReadbackConfig};
use std::sync::Arc;

fn main() {
    let backend = Arc::new(DummyBackend::new());
    let gradient: Vec<u8> = (0..256).map(|i| i as u8).collect();
    let texture = backend.add_texture(8, 8, 1, 4, &gradient);

    let readback = AsyncReadback::new(backend.clone(), ReadbackConfig::default());
    let queue = CallbackQueue::new();
    readback.set_scheduler(queue.clone());

    println!("=== External Buffer Demo ===\n");

    // A destination exactly the right size.
    let mut exact = vec![0u8; 256];
    let exact_len = exact.len();
    let request = unsafe {
        readback.create_texture_transfer_into(exact.as_mut_ptr(), exact_len, texture, 0)
    };
    while !request.done() {
        queue.run_pending();
        readback.update_once();
    }
    let (ptr, len) = request.data_ptr().unwrap();
    println!("exact destination: {} bytes written", len);
    println!("result pointer is the caller's: {}", ptr == exact.as_ptr());
    println!("first texels: {:?}\n", &exact[..8]);

    // A destination that is too small: the copy clamps, the request
    // still succeeds, and a truncation diagnostic is emitted.
    let mut small = vec![0u8; 64];
    let small_len = small.len();
    let request = unsafe {
        readback.create_texture_transfer_into(small.as_mut_ptr(), small_len, texture, 0)
    };
    while !request.done() {
        queue.run_pending();
        readback.update_once();
    }
    println!("small destination: error = {}", request.has_error());
    println!("bytes written: {}", request.data_ptr().map_or(0, |(_, len)| len));

    println!("\n{}", readback.stats());
}
