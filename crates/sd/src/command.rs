//! SD commands framed for the SPI physical layer.
//!
//! Every command and application command is a value implementing
//! [`Command`]; [`Command::frame`] produces the six-byte wire frame
//! `{0x40|index, arg[31:24..0], crc7|1}` the driver shifts out on MOSI.
//! Unlike an SDHC host controller (which has a command register that
//! frames and checksums for you) SPI mode leaves all of that to the
//! driver, so this module keeps the teacher's `Command` trait shape but
//! adds the explicit byte framing the host-controller version didn't
//! need.

use crate::crc7::crc7;

/// A command or application command (ACMD) ready to be framed.
pub trait Command {
    /// Command index, 0..64.
    const INDEX: u8;
    /// True for application commands, which must be preceded by CMD55.
    const IS_APP: bool = false;

    fn argument(&self) -> u32 {
        0
    }

    /// Produces the six-byte SPI command frame.
    fn frame(&self) -> [u8; 6] {
        let arg = self.argument();
        let mut buf = [
            0x40 | Self::INDEX,
            (arg >> 24) as u8,
            (arg >> 16) as u8,
            (arg >> 8) as u8,
            arg as u8,
            0,
        ];
        buf[5] = crc7(&buf[..5]);
        buf
    }
}

macro_rules! simple_command {
    ($name:ident, $index:expr) => {
        pub struct $name;
        impl Command for $name {
            const INDEX: u8 = $index;
        }
    };
    ($name:ident, $index:expr, app) => {
        pub struct $name;
        impl Command for $name {
            const INDEX: u8 = $index;
            const IS_APP: bool = true;
        }
    };
}

simple_command!(Cmd0GoIdleState, 0);
simple_command!(Cmd9SendCsd, 9);
simple_command!(Cmd10SendCid, 10);
simple_command!(Cmd12StopTransmission, 12);
simple_command!(Cmd55AppCmd, 55);
simple_command!(Acmd13SdStatus, 13, app);

/// CMD8: SEND_IF_COND. Argument encodes the supply-voltage indicator
/// (bits 11:8, `0b0001` for 2.7-3.6V) and an 8-bit check pattern echoed
/// back by the card.
pub struct Cmd8SendIfCond {
    pub check_pattern: u8,
}
impl Command for Cmd8SendIfCond {
    const INDEX: u8 = 8;
    fn argument(&self) -> u32 {
        0x1_00 | self.check_pattern as u32
    }
}

/// CMD17: READ_SINGLE_BLOCK. Argument is the sector (block) address.
pub struct Cmd17ReadSingleBlock(pub u32);
impl Command for Cmd17ReadSingleBlock {
    const INDEX: u8 = 17;
    fn argument(&self) -> u32 {
        self.0
    }
}

/// CMD24: WRITE_BLOCK.
pub struct Cmd24WriteBlock(pub u32);
impl Command for Cmd24WriteBlock {
    const INDEX: u8 = 24;
    fn argument(&self) -> u32 {
        self.0
    }
}

/// CMD25: WRITE_MULTIPLE_BLOCK.
pub struct Cmd25WriteMultipleBlock(pub u32);
impl Command for Cmd25WriteMultipleBlock {
    const INDEX: u8 = 25;
    fn argument(&self) -> u32 {
        self.0
    }
}

/// CMD32: ERASE_WR_BLK_START.
pub struct Cmd32EraseWrBlkStart(pub u32);
impl Command for Cmd32EraseWrBlkStart {
    const INDEX: u8 = 32;
    fn argument(&self) -> u32 {
        self.0
    }
}

/// CMD33: ERASE_WR_BLK_END.
pub struct Cmd33EraseWrBlkEnd(pub u32);
impl Command for Cmd33EraseWrBlkEnd {
    const INDEX: u8 = 33;
    fn argument(&self) -> u32 {
        self.0
    }
}

simple_command!(Cmd38Erase, 38);

/// CMD58: READ_OCR.
simple_command!(Cmd58ReadOcr, 58);

/// ACMD23: SET_WR_BLK_ERASE_COUNT. Number of blocks to pre-erase before
/// the next multi-block write.
pub struct Acmd23SetWrBlkEraseCount(pub u32);
impl Command for Acmd23SetWrBlkEraseCount {
    const INDEX: u8 = 23;
    const IS_APP: bool = true;
    fn argument(&self) -> u32 {
        self.0
    }
}

/// ACMD41: SD_SEND_OP_COND. HCS (bit 30) requests SDHC/SDXC addressing.
pub struct Acmd41SdSendOpCond {
    pub hcs: bool,
}
impl Command for Acmd41SdSendOpCond {
    const INDEX: u8 = 41;
    const IS_APP: bool = true;
    fn argument(&self) -> u32 {
        if self.hcs {
            1 << 30
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd0_frame_matches_known_vector() {
        assert_eq!(Cmd0GoIdleState.frame(), [0x40, 0x00, 0x00, 0x00, 0x00, 0x95]);
    }

    #[test]
    fn cmd8_frame_matches_known_vector() {
        let cmd = Cmd8SendIfCond { check_pattern: 0xAA };
        assert_eq!(cmd.frame(), [0x48, 0x00, 0x00, 0x01, 0xAA, 0x87]);
    }
}
