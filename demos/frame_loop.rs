//! Frame loop example
//!
//! Demonstrates the typical single-threaded setup: one thread plays both
//! roles, draining the render queue and running the update cycle once per
//! frame, with a screenshot readback kicked off every second.

use readback::{AsyncReadback, CallbackQueue, DummyBackend, ReadbackConfig, ReadbackRequest};
use readback::TextureHandle;
use std::sync::Arc;

fn main() {
    // Stand-in for a real renderer: a 64x64 RGBA framebuffer in RAM.
    // Fences take a couple of polls to signal, like real hardware.
    let backend = Arc::new(DummyBackend::new());
    backend.set_fence_latency(2);

    let readback = AsyncReadback::new(backend.clone(), ReadbackConfig::default());
    let queue = CallbackQueue::new();
    readback.set_scheduler(queue.clone());

    println!("=== Frame Loop Demo ===\n");

    let mut pending: Vec<(usize, ReadbackRequest)> = Vec::new();

    for frame in 0..300usize {
        // Render thread role: run whatever the registry scheduled.
        queue.run_pending();

        // Take a screenshot every 60 frames.
        if frame % 60 == 0 {
            let framebuffer = render_framebuffer(&backend, frame);
            let request = readback.create_texture_transfer(framebuffer, 0);
            println!("frame {:3}: screenshot requested (id {})", frame, request.id());
            pending.push((frame, request));
        }

        // Collect screenshots that landed.
        pending.retain(|(requested_at, request)| {
            if !request.done() {
                return true;
            }
            if request.has_error() {
                println!(
                    "frame {:3}: screenshot from frame {} failed",
                    frame, requested_at
                );
            } else if let Some((len, checksum)) = request.with_data(|bytes| {
                (bytes.len(), bytes.iter().map(|&b| u64::from(b)).sum::<u64>())
            }) {
                println!(
                    "frame {:3}: screenshot from frame {} landed, {} bytes, checksum {}",
                    frame, requested_at, len, checksum
                );
            }
            false
        });

        // Control thread role: dispose finished requests and schedule
        // the next polling pass.
        readback.update_once();
    }

    println!("\n{}", readback.stats());
}

fn render_framebuffer(backend: &DummyBackend, frame: usize) -> TextureHandle {
    // Each "render" produces a fresh texture whose pixels depend on the
    // frame number.
    let mut pixels = vec![0u8; 64 * 64 * 4];
    for (i, px) in pixels.iter_mut().enumerate() {
        *px = ((i + frame) % 256) as u8;
    }
    backend.add_texture(64, 64, 1, 4, &pixels)
}
