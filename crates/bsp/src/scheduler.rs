//! Cooperative callback table driven by the 1 kHz tick.
//!
//! The original firmware divides its single hardware timer down into
//! several ISR vectors firing at different fixed rates (1024 Hz, 50 Hz,
//! the RTC's 1 Hz pin-change). This scheduler generalises that into one
//! table of (callback, period, counter) entries decremented on every
//! tick, so the framed I/O channel and the motion auto-read (the two
//! periodic tasks this core owns) can be registered instead of wired into
//! bespoke vectors.

const MAX_ENTRIES: usize = 8;

#[derive(Clone, Copy)]
struct Entry {
    callback: fn(),
    period: u32,
    counter: u32,
}

pub struct Scheduler {
    entries: [Option<Entry>; MAX_ENTRIES],
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableFull;

impl Scheduler {
    pub const fn new() -> Self {
        Scheduler {
            entries: [None; MAX_ENTRIES],
        }
    }

    /// Registers `callback` to run every `period_ticks` ticks, starting
    /// `period_ticks` ticks from now. Returns the slot index on success.
    pub fn register(&mut self, callback: fn(), period_ticks: u32) -> Result<usize, TableFull> {
        debug_assert!(period_ticks > 0);
        for (i, slot) in self.entries.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(Entry {
                    callback,
                    period: period_ticks,
                    counter: period_ticks,
                });
                return Ok(i);
            }
        }
        Err(TableFull)
    }

    pub fn unregister(&mut self, index: usize) {
        self.entries[index] = None;
    }

    /// Advances every registered entry by one tick, invoking and
    /// reloading any whose counter has reached zero. Call this from the
    /// same place [`crate::timer::Ticks::tick`] is called.
    pub fn tick(&mut self) {
        for slot in self.entries.iter_mut() {
            if let Some(entry) = slot {
                entry.counter -= 1;
                if entry.counter == 0 {
                    entry.counter = entry.period;
                    (entry.callback)();
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    static HITS: AtomicU32 = AtomicU32::new(0);

    fn bump() {
        HITS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn callback_fires_every_period() {
        HITS.store(0, Ordering::Relaxed);
        let mut s = Scheduler::new();
        s.register(bump, 4).unwrap();
        for _ in 0..17 {
            s.tick();
        }
        assert_eq!(HITS.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn table_full_is_reported() {
        let mut s = Scheduler::new();
        for _ in 0..MAX_ENTRIES {
            s.register(bump, 1).unwrap();
        }
        assert_eq!(s.register(bump, 1), Err(TableFull));
    }
}
