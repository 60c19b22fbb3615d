//! The subset of STK500v2 command and status codes this bootloader
//! implements, matching the `case` labels in the AVR ISP dispatch loop
//! this module is grounded on.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SignOn,
    SetParameter,
    GetParameter,
    LoadAddress,
    EnterProgmodeIsp,
    LeaveProgmodeIsp,
    ChipEraseIsp,
    ProgramFlashIsp,
    ReadFlashIsp,
    ProgramEepromIsp,
    ReadEepromIsp,
    ReadLockIsp,
    ReadSignatureIsp,
    ReadFuseIsp,
    SpiMulti,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Command> {
        Some(match b {
            0x01 => Command::SignOn,
            0x02 => Command::SetParameter,
            0x03 => Command::GetParameter,
            0x06 => Command::LoadAddress,
            0x10 => Command::EnterProgmodeIsp,
            0x11 => Command::LeaveProgmodeIsp,
            0x12 => Command::ChipEraseIsp,
            0x13 => Command::ProgramFlashIsp,
            0x14 => Command::ReadFlashIsp,
            0x15 => Command::ProgramEepromIsp,
            0x16 => Command::ReadEepromIsp,
            0x18 => Command::ReadLockIsp,
            0x19 => Command::ReadSignatureIsp,
            0x1A => Command::ReadFuseIsp,
            0x1D => Command::SpiMulti,
            _ => return None,
        })
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Command::SignOn => 0x01,
            Command::SetParameter => 0x02,
            Command::GetParameter => 0x03,
            Command::LoadAddress => 0x06,
            Command::EnterProgmodeIsp => 0x10,
            Command::LeaveProgmodeIsp => 0x11,
            Command::ChipEraseIsp => 0x12,
            Command::ProgramFlashIsp => 0x13,
            Command::ReadFlashIsp => 0x14,
            Command::ProgramEepromIsp => 0x15,
            Command::ReadEepromIsp => 0x16,
            Command::ReadLockIsp => 0x18,
            Command::ReadSignatureIsp => 0x19,
            Command::ReadFuseIsp => 0x1A,
            Command::SpiMulti => 0x1D,
        }
    }
}

pub const STATUS_CMD_OK: u8 = 0x00;
pub const STATUS_CMD_FAILED: u8 = 0xC0;
pub const STATUS_CMD_UNKNOWN: u8 = 0xC9;

/// `GET_PARAMETER`/`SET_PARAMETER` parameter indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    BuildNumberLow,
    BuildNumberHigh,
    HwVer,
    SwMajor,
    SwMinor,
    VTarget,
}

impl Parameter {
    pub fn from_byte(b: u8) -> Option<Parameter> {
        Some(match b {
            0x90 => Parameter::BuildNumberLow,
            0x91 => Parameter::BuildNumberHigh,
            0x98 => Parameter::HwVer,
            0x93 => Parameter::SwMajor,
            0x94 => Parameter::SwMinor,
            0x82 => Parameter::VTarget,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_byte_round_trips() {
        for cmd in [
            Command::SignOn,
            Command::SpiMulti,
            Command::GetParameter,
            Command::SetParameter,
            Command::EnterProgmodeIsp,
            Command::LeaveProgmodeIsp,
            Command::LoadAddress,
            Command::ProgramFlashIsp,
            Command::ProgramEepromIsp,
            Command::ReadFlashIsp,
            Command::ReadEepromIsp,
            Command::ReadSignatureIsp,
            Command::ReadLockIsp,
            Command::ReadFuseIsp,
        ] {
            assert_eq!(Command::from_byte(cmd.to_byte()), Some(cmd));
        }
    }

    #[test]
    fn unknown_byte_yields_none() {
        assert_eq!(Command::from_byte(0xFE), None);
    }
}
