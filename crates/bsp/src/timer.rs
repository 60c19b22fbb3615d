//! Monotonic timekeeping: a free-running microsecond counter abstraction
//! plus the millisecond/second tick counters the scheduler advances.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

/// A free-running hardware counter read in microseconds, analogous to the
/// ARM system timer's 64-bit `CHI:CLO` pair: a single monotonically
/// increasing value with no wraparound handling pushed onto callers.
pub trait Clock {
    /// Microseconds since an arbitrary but fixed epoch (usually boot).
    fn now_us(&self) -> u64;

    /// Busy-waits until `condition` becomes true or `timeout` elapses,
    /// returning the remaining budget on success.
    fn wait_for<C: Fn() -> bool>(&self, condition: C, timeout: Duration) -> Result<Duration, ()> {
        let start = self.now_us();
        let timeout_us = timeout.as_micros() as u64;
        loop {
            if condition() {
                let spent = self.now_us().wrapping_sub(start);
                return Ok(Duration::from_micros(timeout_us.saturating_sub(spent)));
            }
            if self.now_us().wrapping_sub(start) >= timeout_us {
                return Err(());
            }
        }
    }

    /// Busy-waits for exactly `d`.
    fn wait(&self, d: Duration) {
        let start = self.now_us();
        let target = d.as_micros() as u64;
        while self.now_us().wrapping_sub(start) < target {}
    }
}

/// The three monotonic counters the 1 kHz tick derives: microseconds
/// within the current millisecond, whole milliseconds, and whole seconds.
/// `tick` is meant to be called from the timer ISR; the accessors are
/// meant to be called from foreground code, so all state is atomic.
#[derive(Default)]
pub struct Ticks {
    ms: AtomicU32,
    s: AtomicU32,
    ms_per_s: AtomicU32,
}

impl Ticks {
    pub const fn new() -> Self {
        Ticks {
            ms: AtomicU32::new(0),
            s: AtomicU32::new(0),
            ms_per_s: AtomicU32::new(0),
        }
    }

    /// Advances the counters by one millisecond. Call this once per 1 kHz
    /// tick interrupt.
    pub fn tick(&self) {
        self.ms.fetch_add(1, Ordering::Relaxed);
        let elapsed = self.ms_per_s.fetch_add(1, Ordering::Relaxed) + 1;
        if elapsed >= 1000 {
            self.ms_per_s.store(0, Ordering::Relaxed);
            self.s.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn time_ms(&self) -> u32 {
        self.ms.load(Ordering::Relaxed)
    }

    pub fn time_s(&self) -> u32 {
        self.s.load(Ordering::Relaxed)
    }

    /// Microseconds elapsed within the current millisecond, reconstructed
    /// from a free-running hardware counter rather than counted by the
    /// tick itself (the tick only fires once per millisecond).
    pub fn time_us<C: Clock>(&self, clock: &C) -> u16 {
        (clock.now_us() % 1000) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_roll_seconds_over() {
        let t = Ticks::new();
        for _ in 0..2500 {
            t.tick();
        }
        assert_eq!(t.time_ms(), 2500);
        assert_eq!(t.time_s(), 2);
    }
}
