//! Build script for readback.
//!
//! Provides build-time diagnostics, feature detection, and helpful messages
//! for users integrating readback into their projects.

use std::env;

fn main() {
    // Re-run if features change
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    // Collect enabled features
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();

    // Get build profile
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    // =========================================================================
    // Feature-specific diagnostics
    // =========================================================================

    // --- Parking Lot ---
    if parking_lot_enabled {
        emit_info("Using parking_lot for mutexes (faster lock implementation)");
    }

    // --- Diagnostics ---
    if diagnostics_enabled {
        emit_info("Diagnostics enabled for release builds");
        emit_note("RB-coded warnings (lost fences, truncation, missing scheduler)");
        emit_note("will be reported even with optimizations on.");
    } else if is_release && !log_enabled {
        emit_note("Tip: release builds stay silent unless 'diagnostics' or 'log' is enabled:");
        emit_note("  readback = { version = \"0.3\", features = [\"diagnostics\"] }");
    }

    // --- Log Integration ---
    if log_enabled {
        emit_info("Routing diagnostics through the log crate");
        emit_note("Install a logger (env_logger, tracing-log, ...) to see RB-coded events.");
    }

    // =========================================================================
    // Release build recommendations
    // =========================================================================

    if is_release {
        emit_info("Building in release mode");

        if !parking_lot_enabled {
            emit_note("Tip: Consider enabling 'parking_lot' for better mutex performance:");
            emit_note("  readback = { version = \"0.3\", features = [\"parking_lot\"] }");
        }
    }

    // =========================================================================
    // Common usage reminders
    // =========================================================================

    emit_separator();
    emit_info("readback Quick Reference");
    emit_separator();
    emit_note("Wire up a render scheduler once at startup:");
    emit_note("  readback.set_scheduler(queue.clone());");
    emit_note("");
    emit_note("Kick off transfers from any thread:");
    emit_note("  let request = readback.create_texture_transfer(texture, 0);");
    emit_note("");
    emit_note("Pump both sides every frame:");
    emit_note("  queue.run_pending();    // render thread");
    emit_note("  readback.update_once(); // control thread");
    emit_separator();

    // =========================================================================
    // Environment checks
    // =========================================================================

    check_target_features();
}

// =============================================================================
// Diagnostic emission helpers
// =============================================================================

fn emit_info(msg: &str) {
    println!("cargo:warning=[readback] ℹ️  {}", msg);
}

fn emit_note(msg: &str) {
    if msg.is_empty() {
        println!("cargo:warning=[readback]");
    } else {
        println!("cargo:warning=[readback]    {}", msg);
    }
}

fn emit_separator() {
    println!("cargo:warning=[readback] ────────────────────────────────────────");
}

// =============================================================================
// Environment and toolchain checks
// =============================================================================

fn check_target_features() {
    let target = env::var("TARGET").unwrap_or_default();

    if target.contains("wasm") {
        emit_info("WebAssembly target detected");
        emit_note("readback works on WASM but with some limitations:");
        emit_note("  • wait_for_completion() blocks; without threads the render");
        emit_note("    queue cannot be pumped concurrently, so prefer polling");
        emit_note("    done() from the main loop instead.");
    }
}
