//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `meetpoint_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("meetpoint_core ping={}", meetpoint_core::ping());
    println!("meetpoint_core version={}", meetpoint_core::core_version());
}
