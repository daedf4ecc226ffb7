//! Per-device fixed-window rate limiting for outbound sends.
//!
//! Each device gets a window that starts on its first observed request. Once more than
//! the window length has elapsed since the window start, the next request resets it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Gate consulted before each mesh-originated request.
pub trait RateLimit: Send + Sync {
    /// Returns true and consumes one slot when the device is under its ceiling.
    fn allow(&self, device_id: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

struct Tracked {
    windows: HashMap<String, Window>,
    /// Map size at which the next prune runs. Raised after a prune that frees little so a
    /// flood of active devices does not rescan the map on every new id.
    next_prune: usize,
}

/// Fixed-window limiter keyed by device id. All windows live behind one mutex, so checks
/// for the same device are linearizable.
pub struct FixedWindowLimiter {
    ceiling: u32,
    window: Duration,
    max_devices: usize,
    tracked: Mutex<Tracked>,
}

impl FixedWindowLimiter {
    pub fn new(ceiling: u32, window: Duration, max_devices: usize) -> Self {
        let max_devices = max_devices.max(1);
        Self {
            ceiling,
            window,
            max_devices,
            tracked: Mutex::new(Tracked {
                windows: HashMap::new(),
                next_prune: max_devices,
            }),
        }
    }

    /// Number of devices currently tracked.
    pub fn tracked(&self) -> usize {
        self.tracked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .windows
            .len()
    }

    /// `allow` evaluated at an explicit instant.
    pub fn allow_at(&self, device_id: &str, now: Instant) -> bool {
        let mut g = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        let Tracked {
            windows,
            next_prune,
        } = &mut *g;
        if !windows.contains_key(device_id) && windows.len() >= *next_prune {
            let window = self.window;
            windows.retain(|_, w| now.saturating_duration_since(w.started) <= window);
            let step = (self.max_devices / 4).max(1);
            *next_prune = self.max_devices.max(windows.len() + step);
        }
        let w = windows.entry(device_id.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(w.started) > self.window {
            w.started = now;
            w.count = 0;
        }
        if w.count >= self.ceiling {
            return false;
        }
        w.count += 1;
        true
    }
}

impl RateLimit for FixedWindowLimiter {
    fn allow(&self, device_id: &str) -> bool {
        self.allow_at(device_id, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn first_call_always_allowed() {
        let limiter = FixedWindowLimiter::new(10, MINUTE, 16);
        assert!(limiter.allow("!a1b2c3d4"));
    }

    #[test]
    fn ceiling_plus_one_is_rejected() {
        let limiter = FixedWindowLimiter::new(10, MINUTE, 16);
        let t0 = Instant::now();
        for i in 0..10 {
            assert!(limiter.allow_at("dev", t0 + Duration::from_secs(i)), "call {}", i);
        }
        assert!(!limiter.allow_at("dev", t0 + Duration::from_secs(30)));
        assert!(!limiter.allow_at("dev", t0 + MINUTE));
    }

    #[test]
    fn window_resets_after_a_minute() {
        let limiter = FixedWindowLimiter::new(2, MINUTE, 16);
        let t0 = Instant::now();
        assert!(limiter.allow_at("dev", t0));
        assert!(limiter.allow_at("dev", t0));
        assert!(!limiter.allow_at("dev", t0 + Duration::from_secs(10)));
        let later = t0 + MINUTE + Duration::from_millis(1);
        assert!(limiter.allow_at("dev", later));
        assert!(limiter.allow_at("dev", later));
        assert!(!limiter.allow_at("dev", later));
    }

    #[test]
    fn devices_are_independent() {
        let limiter = FixedWindowLimiter::new(1, MINUTE, 16);
        let t0 = Instant::now();
        assert!(limiter.allow_at("a", t0));
        assert!(!limiter.allow_at("a", t0));
        assert!(limiter.allow_at("b", t0));
    }

    #[test]
    fn pruning_drops_only_expired_windows() {
        let limiter = FixedWindowLimiter::new(1, MINUTE, 2);
        let t0 = Instant::now();
        assert!(limiter.allow_at("old", t0));
        assert!(limiter.allow_at("active", t0 + Duration::from_secs(50)));
        assert!(limiter.allow_at("new", t0 + Duration::from_secs(70)));
        assert_eq!(limiter.tracked(), 2);
        assert!(!limiter.allow_at("active", t0 + Duration::from_secs(75)));
    }

    #[test]
    fn futile_prune_defers_the_next_scan() {
        let limiter = FixedWindowLimiter::new(1, MINUTE, 8);
        let t0 = Instant::now();
        for i in 0..8 {
            assert!(limiter.allow_at(&format!("d{}", i), t0));
        }
        // every window is active: nothing pruned, next scan deferred by a quarter of the cap
        assert!(limiter.allow_at("d8", t0 + Duration::from_secs(10)));
        assert_eq!(limiter.tracked(), 9);
        // d0..d7 have expired, but the map has not grown enough to scan again
        assert!(limiter.allow_at("d9", t0 + Duration::from_secs(70)));
        assert_eq!(limiter.tracked(), 10);
        assert!(limiter.allow_at("d10", t0 + Duration::from_secs(70)));
        assert_eq!(limiter.tracked(), 3);
    }

    #[test]
    fn concurrent_calls_never_exceed_ceiling() {
        let limiter = Arc::new(FixedWindowLimiter::new(10, MINUTE, 16));
        let allowed = Arc::new(AtomicU32::new(0));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                let allowed = allowed.clone();
                std::thread::spawn(move || {
                    for _ in 0..8 {
                        if limiter.allow("shared") {
                            allowed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(allowed.load(Ordering::SeqCst), 10);
    }
}
