//! Core-pinned thread spawning for the flash-writer task.
//!
//! Adapted from the firmware crate's RPC I/O thread spawn: wraps
//! `esp_pthread_set_cfg()` so `std::thread::spawn` creates a FreeRTOS task
//! with an explicit priority and stack size. On non-ESP targets, falls back
//! to a plain thread with the requested stack size and ignores priority.

/// Spawn a thread with the given FreeRTOS priority and stack size.
///
/// On ESP-IDF, uses `esp_pthread_set_cfg()` ahead of `std::thread::Builder`.
/// The `name` parameter must be a null-terminated string.
#[cfg(target_os = "espidf")]
pub fn spawn_with_priority(
    priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.prio = priority as i32;
        cfg.stack_size = stack_bytes as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        assert!(
            ret == esp_idf_sys::ESP_OK as i32,
            "esp_pthread_set_cfg failed: {ret}"
        );
    }

    let display_name = name.trim_end_matches('\0');
    log::info!("spawning '{}' (pri={}, stack={}B)", display_name, priority, stack_bytes);

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .expect("spawn_with_priority: thread creation failed")
}

/// Simulation fallback — ignores FreeRTOS priority, honors the stack size.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_with_priority(
    _priority: u8,
    stack_bytes: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    let display_name = name.trim_end_matches('\0');
    log::info!("spawning '{}' (sim, stack={}B)", display_name, stack_bytes);

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_bytes)
        .spawn(f)
        .expect("spawn_with_priority(sim): thread creation failed")
}
