//! Multi-block streaming writer: the non-caching flavour that returns at
//! every block boundary, and the caching flavour that absorbs the card's
//! post-block busy latency into a bounded 512-byte cache instead of
//! stalling the caller.

use core::time::Duration;

use bsp::Clock;

use crate::block::{CMD_TIMEOUT, RW_TIMEOUT};
use crate::command::{
    Acmd23SetWrBlkEraseCount, Cmd12StopTransmission, Cmd25WriteMultipleBlock, Cmd55AppCmd, Command,
};
use crate::error::Error;
use crate::response::{data_response_accepted, is_card_ready, R1, TOKEN_START_BLOCK_MULTI, TOKEN_STOP_TRAN};
use crate::spi::SpiBus;

const SD_CACHE_SIZE: usize = 512;
const FILLER_BYTE: u8 = 0x55;

/// Multi-block write session state, mirroring the streaming writer's data
/// model one-for-one: every field here exists because some later step in
/// the algorithm reads it back.
pub struct StreamWriter<S: SpiBus, C: Clock> {
    bus: S,
    clock: C,
    open: bool,
    address: u32,
    must_wait: bool,
    numwritten: u16,
    block_started: bool,
    t_stop_us: u64,
    cache: [u8; SD_CACHE_SIZE],
    cache_n: u16,
    must_preerase: bool,
    preerase_count: u32,
    error_count: u32,
}

impl<S: SpiBus, C: Clock> StreamWriter<S, C> {
    pub fn new(bus: S, clock: C) -> Self {
        StreamWriter {
            bus,
            clock,
            open: false,
            address: 0,
            must_wait: false,
            numwritten: 0,
            block_started: false,
            t_stop_us: 0,
            cache: [0u8; SD_CACHE_SIZE],
            cache_n: 0,
            must_preerase: false,
            preerase_count: 0,
            error_count: 0,
        }
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Resets session state; the multi-block write itself opens lazily on
    /// the first byte written.
    pub fn stream_open(&mut self, start_sector: u32, preerase_sectors: u32) {
        self.open = false;
        self.address = start_sector;
        self.must_wait = false;
        self.numwritten = 0;
        self.block_started = false;
        self.cache_n = 0;
        self.must_preerase = preerase_sectors > 0;
        self.preerase_count = preerase_sectors;
    }

    fn ensure_session_open(&mut self) -> Result<(), Error> {
        if self.open {
            return Ok(());
        }
        if self.must_preerase {
            send_r1(&mut self.bus, &self.clock, Cmd55AppCmd)?;
            send_r1(&mut self.bus, &self.clock, Acmd23SetWrBlkEraseCount(self.preerase_count))?;
        }
        send_r1(&mut self.bus, &self.clock, Cmd25WriteMultipleBlock(self.address))?;
        self.open = true;
        Ok(())
    }

    /// Stops the current block without waiting for the card to finish
    /// flushing it: sends the CRC tail and reads the data-response token,
    /// then marks `must_wait` so the next call absorbs the busy latency.
    fn stop_block_nowait(&mut self) -> Result<(), Error> {
        self.bus.write_byte(0xFF);
        self.bus.write_byte(0xFF);
        let resp = self.bus.read_byte();
        if !data_response_accepted(resp) {
            self.error_count += 1;
            return Err(Error::WriteRejected);
        }
        self.t_stop_us = self.clock.now_us();
        self.must_wait = true;
        self.address += 1;
        self.block_started = false;
        self.numwritten = 0;
        Ok(())
    }

    /// Non-caching writer: writes directly into the open block and
    /// returns as soon as one block boundary is crossed (or input runs
    /// out first), so the caller can interleave side-structure updates
    /// between blocks. Returns the number of bytes consumed and, if a
    /// block was completed, the sector it was written to.
    pub fn stream_write(&mut self, data: &[u8]) -> Result<(usize, Option<u32>), Error> {
        if data.is_empty() {
            return Ok((0, None));
        }
        self.ensure_session_open()?;
        if !self.block_started {
            self.bus.write_byte(TOKEN_START_BLOCK_MULTI);
            self.numwritten = 0;
            self.block_started = true;
        }
        let room = 512 - self.numwritten as usize;
        let n = core::cmp::min(room, data.len());
        for &b in &data[..n] {
            self.bus.write_byte(b);
        }
        self.numwritten += n as u16;
        if self.numwritten as usize == 512 {
            let completed = self.address;
            self.stop_block_nowait()?;
            wait_ready(&mut self.bus, &self.clock, RW_TIMEOUT)?;
            self.must_wait = false;
            return Ok((n, Some(completed)));
        }
        Ok((n, None))
    }

    /// Caching writer: absorbs the card's post-block busy interval into
    /// `cache` instead of blocking the caller, per the five-step
    /// algorithm this type exists to implement.
    pub fn streamcache_write(&mut self, data: &[u8]) -> Result<(), Error> {
        // Step 1: drain a pending must-wait phase.
        if self.must_wait {
            if is_card_ready(self.bus.read_byte()) {
                self.must_wait = false;
            } else if data.len() <= SD_CACHE_SIZE - self.cache_n as usize {
                for &b in data {
                    self.cache[self.cache_n as usize] = b;
                    self.cache_n += 1;
                }
                return Ok(());
            } else {
                let deadline = self.t_stop_us + RW_TIMEOUT.as_micros() as u64;
                loop {
                    if is_card_ready(self.bus.read_byte()) {
                        self.must_wait = false;
                        break;
                    }
                    if self.clock.now_us() >= deadline {
                        self.close_session_on_error();
                        self.error_count += 1;
                        return Err(Error::WriteTimeout);
                    }
                }
            }
        }

        // Step 2: nothing queued and nothing to do.
        if data.is_empty() && self.cache_n == 0 {
            return Ok(());
        }

        // Step 3: open the session lazily.
        self.ensure_session_open()?;

        // Step 4: start the block if needed.
        if !self.block_started {
            self.bus.write_byte(TOKEN_START_BLOCK_MULTI);
            self.numwritten = 0;
            self.block_started = true;
        }

        // Step 5: drain the cache first, then the caller's bytes, never
        // growing past the block boundary.
        let mut remaining_cache = self.cache_n as usize;
        let mut cache_idx = 0usize;
        while remaining_cache > 0 && (self.numwritten as usize) < 512 {
            self.bus.write_byte(self.cache[cache_idx]);
            cache_idx += 1;
            remaining_cache -= 1;
            self.numwritten += 1;
        }
        // Shift any cache bytes that didn't fit in this block back to the front.
        if cache_idx > 0 {
            self.cache.copy_within(cache_idx..self.cache_n as usize, 0);
            self.cache_n -= cache_idx as u16;
        }

        let mut offset = 0usize;
        while offset < data.len() && (self.numwritten as usize) < 512 {
            self.bus.write_byte(data[offset]);
            offset += 1;
            self.numwritten += 1;
        }

        // Step 6: if the block filled up, stop it without waiting and
        // loop for any bytes still left in the caller's buffer.
        if self.numwritten as usize == 512 {
            self.stop_block_nowait()?;
            if offset < data.len() {
                return self.streamcache_write(&data[offset..]);
            }
            return Ok(());
        }

        // Block not yet full: anything left over goes into the cache.
        if offset < data.len() {
            for &b in &data[offset..] {
                self.cache[self.cache_n as usize] = b;
                self.cache_n += 1;
            }
        }
        Ok(())
    }

    fn close_session_on_error(&mut self) {
        let _ = self.bus.write_byte(TOKEN_STOP_TRAN);
        self.open = false;
        self.block_started = false;
        self.must_wait = false;
    }

    /// Flushes any cached bytes, pads the last partial block with
    /// [`FILLER_BYTE`], closes the multi-block session and returns the
    /// last sector holding user data.
    pub fn stream_close(&mut self) -> Result<u32, Error> {
        self.streamcache_write(&[])?;
        if self.must_wait {
            wait_ready(&mut self.bus, &self.clock, RW_TIMEOUT)?;
            self.must_wait = false;
        }
        let last_sector = if self.block_started {
            let pad = 512 - self.numwritten as usize;
            for _ in 0..pad {
                self.bus.write_byte(FILLER_BYTE);
            }
            self.numwritten = 512;
            let completed = self.address;
            self.stop_block_nowait()?;
            wait_ready(&mut self.bus, &self.clock, RW_TIMEOUT)?;
            self.must_wait = false;
            completed
        } else {
            self.address.wrapping_sub(1)
        };

        if self.open {
            send_r1(&mut self.bus, &self.clock, Cmd12StopTransmission)?;
            self.bus.write_byte(TOKEN_STOP_TRAN);
            wait_ready(&mut self.bus, &self.clock, RW_TIMEOUT)?;
            self.open = false;
        }
        Ok(last_sector)
    }
}

fn send_r1<S: SpiBus, C: Clock, Cmd: Command>(bus: &mut S, clock: &C, cmd: Cmd) -> Result<u8, Error> {
    bus.assert_cs();
    let frame = cmd.frame();
    for &b in &frame {
        bus.write_byte(b);
    }
    let start = clock.now_us();
    loop {
        let b = bus.read_byte();
        if R1::is_valid_token(b) {
            return Ok(b);
        }
        if clock.now_us().wrapping_sub(start) >= CMD_TIMEOUT.as_micros() as u64 {
            return Err(Error::CardUnavailable);
        }
    }
}

fn wait_ready<S: SpiBus, C: Clock>(bus: &mut S, clock: &C, timeout: Duration) -> Result<(), Error> {
    let start = clock.now_us();
    loop {
        if is_card_ready(bus.read_byte()) {
            return Ok(());
        }
        if clock.now_us().wrapping_sub(start) >= timeout.as_micros() as u64 {
            return Err(Error::WriteTimeout);
        }
    }
}
