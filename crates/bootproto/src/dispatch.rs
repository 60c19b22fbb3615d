//! Command dispatch: turns a parsed frame body into a reply body, the
//! way the original ISP loop's big `switch` on `buffer[0]` does. The
//! frame's data section carries the command byte first, exactly as the
//! source frames it, so replies echo that byte back at `reply[0]` the
//! same way.

use crate::command::{Command, Parameter, STATUS_CMD_FAILED, STATUS_CMD_OK};
use crate::programmer::{Fuse, Programmer};

const HW_VER: u8 = 0x0F;
const SW_MAJOR: u8 = 2;
const SW_MINOR: u8 = 0x0A;

pub struct Dispatcher<P: Programmer> {
    programmer: P,
    address: u32,
    signature_index: u8,
}

impl<P: Programmer> Dispatcher<P> {
    pub fn new(programmer: P) -> Self {
        Dispatcher { programmer, address: 0, signature_index: 0 }
    }

    /// Processes one frame's `body`, writing the reply into `reply` and
    /// returning `(reply_len, leave_progmode)`. `leave_progmode` is set
    /// only by `LEAVE_PROGMODE_ISP`; the caller is expected to hand off
    /// to the application once the reply has been sent.
    pub fn process(&mut self, body: &[u8], reply: &mut [u8]) -> (usize, bool) {
        if body.is_empty() {
            reply[0] = 0;
            reply[1] = STATUS_CMD_FAILED;
            return (2, false);
        }
        let cmd_byte = body[0];
        let Some(cmd) = Command::from_byte(cmd_byte) else {
            reply[0] = cmd_byte;
            reply[1] = STATUS_CMD_FAILED;
            return (2, false);
        };
        reply[0] = cmd_byte;

        match cmd {
            Command::SignOn => {
                reply[1] = STATUS_CMD_OK;
                reply[2] = 8;
                reply[3..11].copy_from_slice(b"AVRISP_2");
                (11, false)
            }
            Command::SpiMulti => (self.spi_multi(body, reply), false),
            Command::GetParameter => {
                let value = match body.get(1).copied().and_then(Parameter::from_byte) {
                    Some(Parameter::BuildNumberLow) => 0,
                    Some(Parameter::BuildNumberHigh) => 0,
                    Some(Parameter::HwVer) => HW_VER,
                    Some(Parameter::SwMajor) => SW_MAJOR,
                    Some(Parameter::SwMinor) => SW_MINOR,
                    Some(Parameter::VTarget) => (self.programmer.battery_millivolts() / 100) as u8,
                    None => 0,
                };
                reply[1] = STATUS_CMD_OK;
                reply[2] = value;
                (3, false)
            }
            Command::SetParameter | Command::EnterProgmodeIsp => {
                reply[1] = STATUS_CMD_OK;
                (2, false)
            }
            Command::LeaveProgmodeIsp => {
                reply[1] = STATUS_CMD_OK;
                (2, true)
            }
            Command::LoadAddress => {
                if body.len() >= 5 {
                    let word_address = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);
                    self.address = word_address << 1;
                }
                reply[1] = STATUS_CMD_OK;
                (2, false)
            }
            Command::ChipEraseIsp => {
                self.programmer.chip_erase();
                reply[1] = STATUS_CMD_OK;
                (2, false)
            }
            Command::ProgramFlashIsp => {
                let size = u16::from_be_bytes([body[1], body[2]]) as usize;
                self.programmer.program_flash_page(self.address, &body[3..3 + size]);
                self.address += size as u32;
                reply[1] = STATUS_CMD_OK;
                (2, false)
            }
            Command::ReadFlashIsp => {
                let size = u16::from_be_bytes([body[1], body[2]]) as usize;
                self.programmer.read_flash(self.address, &mut reply[2..2 + size]);
                self.address += size as u32;
                reply[1] = STATUS_CMD_OK;
                reply[2 + size] = STATUS_CMD_OK;
                (2 + size + 1, false)
            }
            Command::ProgramEepromIsp => {
                let size = u16::from_be_bytes([body[1], body[2]]) as usize;
                for (i, &b) in body[3..3 + size].iter().enumerate() {
                    self.programmer.program_eeprom_byte(self.address + i as u32, b);
                }
                self.address += size as u32;
                reply[1] = STATUS_CMD_OK;
                (2, false)
            }
            Command::ReadEepromIsp => {
                let size = u16::from_be_bytes([body[1], body[2]]) as usize;
                for i in 0..size {
                    reply[2 + i] = self.programmer.read_eeprom_byte(self.address + i as u32);
                }
                self.address += size as u32;
                reply[1] = STATUS_CMD_OK;
                reply[2 + size] = STATUS_CMD_OK;
                (2 + size + 1, false)
            }
            Command::ReadSignatureIsp => {
                let sig = self.programmer.signature();
                let byte = sig[self.signature_index as usize % 3];
                self.signature_index = self.signature_index.wrapping_add(1);
                reply[1] = STATUS_CMD_OK;
                reply[2] = byte;
                (3, false)
            }
            Command::ReadLockIsp => {
                reply[1] = STATUS_CMD_OK;
                reply[2] = self.programmer.read_lock();
                (3, false)
            }
            Command::ReadFuseIsp => {
                let fuse = if body.get(2) == Some(&0x50) {
                    if body.get(3) == Some(&0x08) { Fuse::Extended } else { Fuse::Low }
                } else {
                    Fuse::High
                };
                reply[1] = STATUS_CMD_OK;
                reply[2] = self.programmer.read_fuse(fuse);
                (3, false)
            }
        }
    }

    fn spi_multi(&mut self, body: &[u8], reply: &mut [u8]) -> usize {
        let tx = &body[4..];
        let answer = if tx.first() == Some(&0x30) {
            let sig = self.programmer.signature();
            let index = body.get(6).copied().unwrap_or(0);
            sig[(index as usize).min(2)]
        } else if tx.first() == Some(&0x50) && tx.get(1) == Some(&0x00) {
            self.programmer.read_fuse(Fuse::Low)
        } else if tx.first() == Some(&0x58) && tx.get(1) == Some(&0x08) {
            self.programmer.read_fuse(Fuse::High)
        } else if tx.first() == Some(&0x50) && tx.get(1) == Some(&0x08) {
            self.programmer.read_fuse(Fuse::Extended)
        } else {
            0
        };

        reply[1] = STATUS_CMD_OK;
        reply[2] = 0;
        reply[3] = body.get(4).copied().unwrap_or(0);
        reply[4] = 0;
        reply[5] = answer;
        reply[6] = STATUS_CMD_OK;
        7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProgrammer {
        flash: [u8; 64],
        eeprom: [u8; 64],
        lock: u8,
        fuses: [u8; 3],
        erased: bool,
    }

    impl Default for FakeProgrammer {
        fn default() -> Self {
            FakeProgrammer { flash: [0; 64], eeprom: [0; 64], lock: 0xFF, fuses: [0x62, 0xD9, 0xFF], erased: false }
        }
    }

    impl Programmer for FakeProgrammer {
        fn signature(&self) -> [u8; 3] {
            [0x1E, 0x95, 0x0F]
        }
        fn read_fuse(&mut self, which: Fuse) -> u8 {
            match which {
                Fuse::Low => self.fuses[0],
                Fuse::High => self.fuses[1],
                Fuse::Extended => self.fuses[2],
            }
        }
        fn read_lock(&mut self) -> u8 {
            self.lock
        }
        fn chip_erase(&mut self) {
            self.erased = true;
        }
        fn program_flash_page(&mut self, byte_offset: u32, data: &[u8]) {
            self.flash[byte_offset as usize..byte_offset as usize + data.len()].copy_from_slice(data);
        }
        fn read_flash(&mut self, byte_offset: u32, out: &mut [u8]) {
            out.copy_from_slice(&self.flash[byte_offset as usize..byte_offset as usize + out.len()]);
        }
        fn program_eeprom_byte(&mut self, byte_offset: u32, value: u8) {
            self.eeprom[byte_offset as usize] = value;
        }
        fn read_eeprom_byte(&mut self, byte_offset: u32) -> u8 {
            self.eeprom[byte_offset as usize]
        }
        fn battery_millivolts(&mut self) -> u16 {
            3700
        }
    }

    #[test]
    fn sign_on_replies_with_avrisp_2() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (len, leave) = d.process(&[0x01], &mut reply);
        assert!(!leave);
        assert_eq!(&reply[..len], b"\x01\x00\x08AVRISP_2");
    }

    #[test]
    fn unknown_command_fails() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (len, _) = d.process(&[0xFE], &mut reply);
        assert_eq!(&reply[..len], &[0xFE, STATUS_CMD_FAILED]);
    }

    #[test]
    fn leave_progmode_sets_leave_flag() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (_, leave) = d.process(&[0x11], &mut reply);
        assert!(leave);
    }

    #[test]
    fn load_address_then_program_and_read_flash_round_trips() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];

        let (_, _) = d.process(&[0x06, 0, 0, 0, 8], &mut reply); // word address 8 -> byte 16

        let program_body = [0x13u8, 0, 4, 0xDE, 0xAD, 0xBE, 0xEF];
        let (len, _) = d.process(&program_body, &mut reply);
        assert_eq!(&reply[..len], &[0x13, STATUS_CMD_OK]);

        d.process(&[0x06, 0, 0, 0, 8], &mut reply);
        let (len, _) = d.process(&[0x14, 0, 4], &mut reply);
        assert_eq!(&reply[..len], &[0x14, STATUS_CMD_OK, 0xDE, 0xAD, 0xBE, 0xEF, STATUS_CMD_OK]);
    }

    #[test]
    fn spi_multi_emulates_signature_read() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let body = [0x1D, 4, 4, 0, 0x30, 0x00, 0x01];
        let (len, _) = d.process(&body, &mut reply);
        assert_eq!(len, 7);
        assert_eq!(reply[5], 0x95);
    }

    #[test]
    fn spi_multi_emulates_low_fuse_read() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let body = [0x1D, 4, 4, 0, 0x50, 0x00, 0x00];
        d.process(&body, &mut reply);
        assert_eq!(reply[5], 0x62);
    }

    #[test]
    fn read_fuse_isp_selects_low_fuse() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (len, _) = d.process(&[0x1A, 0x50, 0x00], &mut reply);
        assert_eq!(&reply[..len], &[0x1A, STATUS_CMD_OK, 0x62]);
    }

    #[test]
    fn read_fuse_isp_selects_extended_fuse() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (len, _) = d.process(&[0x1A, 0x50, 0x08], &mut reply);
        assert_eq!(&reply[..len], &[0x1A, STATUS_CMD_OK, 0xFF]);
    }

    #[test]
    fn read_fuse_isp_selects_high_fuse() {
        let mut d = Dispatcher::new(FakeProgrammer::default());
        let mut reply = [0u8; 32];
        let (len, _) = d.process(&[0x1A, 0x00, 0x00], &mut reply);
        assert_eq!(&reply[..len], &[0x1A, STATUS_CMD_OK, 0xD9]);
    }
}
