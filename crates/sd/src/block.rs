//! SPI-mode SD block driver: initialisation, single-block read/write and
//! erase. The multi-block streaming path lives in [`crate::stream`].

use core::time::Duration;

use bsp::Clock;

use crate::card::{CardDescriptor, Cid, CsdV2, Ocr};
use crate::command::{
    Acmd41SdSendOpCond, Cmd0GoIdleState, Cmd10SendCid, Cmd17ReadSingleBlock, Cmd24WriteBlock,
    Cmd32EraseWrBlkStart, Cmd33EraseWrBlkEnd, Cmd38Erase, Cmd55AppCmd, Cmd58ReadOcr,
    Cmd8SendIfCond, Cmd9SendCsd, Command,
};
use crate::error::Error;
use crate::response::{data_response_accepted, is_card_ready, R1, TOKEN_START_BLOCK};
use crate::spi::{CsGuard, SpiBus};

pub const CMD_TIMEOUT: Duration = Duration::from_millis(500);
pub const RW_TIMEOUT: Duration = Duration::from_millis(1500);
pub const ERASE_TIMEOUT: Duration = Duration::from_millis(3000);
const RETRY_MAX: u32 = 8;

/// SPI-mode SDHC/SDXC driver. Owns nothing beyond the bus and a clock used
/// to bound how long it polls for readiness.
pub struct SdCard<S: SpiBus, C: Clock> {
    bus: S,
    clock: C,
    pub descriptor: Option<CardDescriptor>,
}

impl<S: SpiBus, C: Clock> SdCard<S, C> {
    pub fn new(bus: S, clock: C) -> Self {
        SdCard { bus, clock, descriptor: None }
    }

    pub fn bus_mut(&mut self) -> &mut S {
        &mut self.bus
    }

    /// Runs the SPI-mode power-up sequence and populates `descriptor`.
    pub fn init(&mut self) -> Result<CardDescriptor, Error> {
        self.bus.deassert_cs();
        for _ in 0..10 {
            self.bus.read_byte();
        }

        let r1 = self.issue_r1(Cmd0GoIdleState)?;
        if r1 & R1::IDLE == 0 {
            return Err(Error::CardUnavailable);
        }

        let (r1, echo) = self.issue_r7(Cmd8SendIfCond { check_pattern: 0xAA })?;
        if r1 & R1::IDLE == 0 || echo[2] != 0x01 || echo[3] != 0xAA {
            return Err(Error::CardUnsupported);
        }

        let start = self.clock.now_us();
        loop {
            self.issue_r1(Cmd55AppCmd)?;
            let r1 = self.issue_r1(Acmd41SdSendOpCond { hcs: true })?;
            if r1 & R1::IDLE == 0 {
                break;
            }
            if self.clock.now_us().wrapping_sub(start) >= CMD_TIMEOUT.as_micros() as u64 {
                return Err(Error::CardUnavailable);
            }
        }

        let (_, ocr_bytes) = self.issue_r7(Cmd58ReadOcr)?;
        let ocr_raw =
            u32::from_be_bytes([ocr_bytes[0], ocr_bytes[1], ocr_bytes[2], ocr_bytes[3]]);
        let ocr = Ocr(ocr_raw);
        if !ocr.ccs() {
            return Err(Error::CardUnsupported);
        }

        let csd_raw = self.issue_r1_readblock(Cmd9SendCsd)?;
        let csd = CsdV2(u128::from_be_bytes(csd_raw));
        if csd.csd_structure() != 1 {
            return Err(Error::CardUnsupported);
        }

        let cid_raw = self.issue_r1_readblock(Cmd10SendCid)?;
        let cid = Cid(u128::from_be_bytes(cid_raw));

        let descriptor = CardDescriptor { ocr, cid, csd };
        self.descriptor = Some(descriptor);
        Ok(descriptor)
    }

    /// Reads sector `sector` into `buf`.
    pub fn block_read(&mut self, sector: u32, buf: &mut [u8; 512]) -> Result<(), Error> {
        let mut guard = CsGuard::new(&mut self.bus);
        let cmd = Cmd17ReadSingleBlock(sector);
        let frame = cmd.frame();
        for &b in &frame {
            guard.bus().write_byte(b);
        }
        wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT)?;
        wait_token(guard.bus(), &self.clock, TOKEN_START_BLOCK, RW_TIMEOUT)?;
        for b in buf.iter_mut() {
            *b = guard.bus().read_byte();
        }
        guard.bus().read_byte();
        guard.bus().read_byte();
        Ok(())
    }

    /// Writes `buf` to sector `sector`.
    pub fn block_write(&mut self, sector: u32, buf: &[u8; 512]) -> Result<(), Error> {
        let mut guard = CsGuard::new(&mut self.bus);
        let cmd = Cmd24WriteBlock(sector);
        let frame = cmd.frame();
        for &b in &frame {
            guard.bus().write_byte(b);
        }
        wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT)?;
        guard.bus().write_byte(TOKEN_START_BLOCK);
        for &b in buf {
            guard.bus().write_byte(b);
        }
        guard.bus().write_byte(0xFF);
        guard.bus().write_byte(0xFF);
        let resp = guard.bus().read_byte();
        if !data_response_accepted(resp) {
            return Err(Error::WriteRejected);
        }
        wait_ready(guard.bus(), &self.clock, RW_TIMEOUT)
    }

    /// Erases the sector range `[start, end]` inclusive.
    pub fn erase(&mut self, start_sector: u32, end_sector: u32) -> Result<(), Error> {
        self.issue_r1(Cmd32EraseWrBlkStart(start_sector))?;
        self.issue_r1(Cmd33EraseWrBlkEnd(end_sector))?;
        let mut guard = CsGuard::new(&mut self.bus);
        let frame = Cmd38Erase.frame();
        for &b in &frame {
            guard.bus().write_byte(b);
        }
        wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT)?;
        wait_ready(guard.bus(), &self.clock, ERASE_TIMEOUT)
    }

    fn issue_r1<Cmd: Command>(&mut self, cmd: Cmd) -> Result<u8, Error> {
        for attempt in 0..RETRY_MAX {
            let mut guard = CsGuard::new(&mut self.bus);
            let frame = cmd_frame(&cmd);
            for &b in &frame {
                guard.bus().write_byte(b);
            }
            match wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT) {
                Ok(r1) => return Ok(r1),
                Err(e) if attempt + 1 == RETRY_MAX => return Err(e),
                Err(_) => continue,
            }
        }
        Err(Error::CardUnavailable)
    }

    fn issue_r7<Cmd: Command>(&mut self, cmd: Cmd) -> Result<(u8, [u8; 4]), Error> {
        let mut guard = CsGuard::new(&mut self.bus);
        let frame = cmd_frame(&cmd);
        for &b in &frame {
            guard.bus().write_byte(b);
        }
        let r1 = wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT)?;
        let mut rest = [0u8; 4];
        for b in rest.iter_mut() {
            *b = guard.bus().read_byte();
        }
        Ok((r1, rest))
    }

    fn issue_r1_readblock<Cmd: Command>(&mut self, cmd: Cmd) -> Result<[u8; 16], Error> {
        let mut guard = CsGuard::new(&mut self.bus);
        let frame = cmd_frame(&cmd);
        for &b in &frame {
            guard.bus().write_byte(b);
        }
        wait_r1(guard.bus(), &self.clock, CMD_TIMEOUT)?;
        wait_token(guard.bus(), &self.clock, TOKEN_START_BLOCK, RW_TIMEOUT)?;
        let mut buf = [0u8; 16];
        for b in buf.iter_mut() {
            *b = guard.bus().read_byte();
        }
        guard.bus().read_byte();
        guard.bus().read_byte();
        Ok(buf)
    }
}

fn cmd_frame<Cmd: Command>(cmd: &Cmd) -> [u8; 6] {
    cmd.frame()
}

fn wait_r1<S: SpiBus, C: Clock>(bus: &mut S, clock: &C, timeout: Duration) -> Result<u8, Error> {
    let start = clock.now_us();
    loop {
        let b = bus.read_byte();
        if R1::is_valid_token(b) {
            return Ok(b);
        }
        if clock.now_us().wrapping_sub(start) >= timeout.as_micros() as u64 {
            return Err(Error::CardUnavailable);
        }
    }
}

fn wait_token<S: SpiBus, C: Clock>(
    bus: &mut S,
    clock: &C,
    token: u8,
    timeout: Duration,
) -> Result<(), Error> {
    let start = clock.now_us();
    loop {
        let b = bus.read_byte();
        if b == token {
            return Ok(());
        }
        if clock.now_us().wrapping_sub(start) >= timeout.as_micros() as u64 {
            return Err(Error::WriteTimeout);
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
