//! Sample ring: the same single-producer/single-consumer atomic-index
//! technique `ringbuf::RingBuffer` uses, generalized from bytes to
//! [`Sample`] records so the motion ISR never blocks and never takes a
//! lock shared with foreground code.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::sample::Sample;

pub struct SampleRing<const N: usize> {
    buf: UnsafeCell<[MaybeUninit<Sample>; N]>,
    write: AtomicUsize,
    read: AtomicUsize,
    overflow_count: AtomicU32,
}

// SAFETY: `write` is only mutated by the ISR producer and `read` only by
// the foreground consumer; each side only touches the buffer slot it
// owns, mirroring `ringbuf::RingBuffer`'s contract.
unsafe impl<const N: usize> Sync for SampleRing<N> {}

impl<const N: usize> SampleRing<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "SampleRing capacity must be a power of two");
        N - 1
    };

    pub const fn new() -> Self {
        let _ = Self::MASK;
        SampleRing {
            // SAFETY: an array of `MaybeUninit<Sample>` needs no
            // initialization regardless of length.
            buf: UnsafeCell::new(unsafe { MaybeUninit::uninit().assume_init() }),
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            overflow_count: AtomicU32::new(0),
        }
    }

    pub fn data_level(&self) -> usize {
        let w = self.write.load(Ordering::Acquire);
        let r = self.read.load(Ordering::Acquire);
        w.wrapping_sub(r) & Self::MASK
    }

    pub fn is_empty(&self) -> bool {
        self.write.load(Ordering::Acquire) == self.read.load(Ordering::Acquire)
    }

    fn is_full(&self) -> bool {
        let w = self.write.load(Ordering::Acquire);
        let r = self.read.load(Ordering::Acquire);
        (w.wrapping_add(1) & Self::MASK) == r
    }

    /// Called from the sensor ISR. On overflow the new sample is
    /// silently dropped and [`Self::overflow_count`] increments; this
    /// never blocks the interrupt.
    pub fn push(&self, sample: Sample) {
        if self.is_full() {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let w = self.write.load(Ordering::Relaxed);
        // SAFETY: only the producer calls `push`, and it is the only
        // writer of slot `w`.
        unsafe { (*self.buf.get())[w].write(sample) };
        self.write.store(w.wrapping_add(1) & Self::MASK, Ordering::Release);
    }

    /// Pops the oldest queued sample, or `None` if empty.
    pub fn data_get_next(&self) -> Option<Sample> {
        if self.is_empty() {
            return None;
        }
        let r = self.read.load(Ordering::Relaxed);
        // SAFETY: only the consumer calls `data_get_next`, and it is the
        // only writer of the `read` index; this slot was written by a
        // prior `push` we have not yet consumed.
        let sample = unsafe { (*self.buf.get())[r].assume_init() };
        self.read.store(r.wrapping_add(1) & Self::MASK, Ordering::Release);
        Some(sample)
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Drops every queued sample and clears the overflow counter, for
    /// `mode = Off`.
    pub fn reset(&self) {
        self.read.store(self.write.load(Ordering::Acquire), Ordering::Release);
        self.overflow_count.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
