//! A single log: a pre-allocated contiguous run of clusters that is
//! opened once, appended to over the node's lifetime, and closed when
//! full or when the caller is done with this session. All the multi-block
//! SPI bookkeeping lives in [`sd::StreamWriter`]; this layer only tracks
//! how many bytes of the pre-allocated extent have been used.

use bsp::Clock;
use sd::spi::SpiBus;
use sd::StreamWriter;

use crate::error::Error;
use crate::types::LogEntry;

pub struct LogWriter<S: SpiBus, C: Clock> {
    inner: StreamWriter<S, C>,
    capacity_bytes: u32,
    len_bytes: u32,
}

impl<S: SpiBus, C: Clock> LogWriter<S, C> {
    /// Opens `entry` for appending, starting the stream at its first
    /// sector. `preerase_sectors` lets a fresh log pre-erase its whole
    /// extent up front; pass 0 to skip that.
    pub fn log_open(
        entry: &LogEntry,
        start_sector: u32,
        capacity_bytes: u32,
        bus: S,
        clock: C,
        preerase_sectors: u32,
    ) -> Result<Self, Error> {
        let _ = entry;
        let mut inner = StreamWriter::new(bus, clock);
        inner.stream_open(start_sector, preerase_sectors);
        Ok(LogWriter { inner, capacity_bytes, len_bytes: 0 })
    }

    /// Appends as much of `data` as still fits in the log's pre-allocated
    /// extent. Returns the number of bytes actually written; a short
    /// count (rather than an error) means the log is now full.
    pub fn put_buffer(&mut self, data: &[u8]) -> Result<usize, Error> {
        let room = self.capacity_bytes.saturating_sub(self.len_bytes) as usize;
        let n = core::cmp::min(room, data.len());
        if n == 0 {
            return Ok(0);
        }
        self.inner.streamcache_write(&data[..n])?;
        self.len_bytes += n as u32;
        Ok(n)
    }

    /// Appends a single byte; see [`Self::put_buffer`].
    pub fn put_char(&mut self, byte: u8) -> Result<usize, Error> {
        self.put_buffer(&[byte])
    }

    /// Flushes and closes the multi-block session, returning the final
    /// length in bytes so the caller can persist it into the log's
    /// directory record.
    pub fn log_close(mut self) -> Result<u32, Error> {
        self.inner.stream_close()?;
        Ok(self.len_bytes)
    }

    pub fn len(&self) -> u32 {
        self.len_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.len_bytes == 0
    }

    pub fn capacity(&self) -> u32 {
        self.capacity_bytes
    }

    pub fn is_full(&self) -> bool {
        self.len_bytes >= self.capacity_bytes
    }

    pub fn error_count(&self) -> u32 {
        self.inner.error_count()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use std::vec::Vec;

    struct FakeClock(RefCell<u64>);
    impl Clock for FakeClock {
        fn now_us(&self) -> u64 {
            let mut t = self.0.borrow_mut();
            *t += 1;
            *t
        }
    }

    struct SinkBus {
        written: Vec<u8>,
    }
    impl SpiBus for SinkBus {
        fn transfer(&mut self, out: u8) -> u8 {
            self.written.push(out);
            0xFF
        }
        fn write_byte(&mut self, out: u8) {
            self.written.push(out);
        }
        fn assert_cs(&mut self) {}
        fn deassert_cs(&mut self) {}
    }

    #[test]
    fn put_buffer_truncates_at_capacity() {
        let entry = LogEntry { name: *b"LOG-0000", start_cluster: 128, size: 0 };
        let bus = SinkBus { written: Vec::new() };
        let clock = FakeClock(RefCell::new(0));
        let mut w = LogWriter::log_open(&entry, 8192, 10, bus, clock, 0).unwrap();

        let written = w.put_buffer(b"hello world").unwrap();
        assert_eq!(written, 10);
        assert!(w.is_full());
        assert_eq!(w.put_buffer(b"more").unwrap(), 0);
    }

    #[test]
    fn put_char_accumulates_length() {
        let entry = LogEntry { name: *b"LOG-0001", start_cluster: 256, size: 0 };
        let bus = SinkBus { written: Vec::new() };
        let clock = FakeClock(RefCell::new(0));
        let mut w = LogWriter::log_open(&entry, 16384, 4, bus, clock, 0).unwrap();

        for b in b"abcd" {
            w.put_char(*b).unwrap();
        }
        assert_eq!(w.len(), 4);
        assert!(w.is_full());
    }
}
