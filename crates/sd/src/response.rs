//! R1 status bits and the data tokens exchanged during block transfers.

/// R1, the one-byte response every command returns first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct R1(pub u8);

impl R1 {
    pub const IDLE: u8 = 1 << 0;
    pub const ERASE_RESET: u8 = 1 << 1;
    pub const ILLEGAL_COMMAND: u8 = 1 << 2;
    pub const CRC_ERROR: u8 = 1 << 3;
    pub const ERASE_SEQ_ERROR: u8 = 1 << 4;
    pub const ADDRESS_ERROR: u8 = 1 << 5;
    pub const PARAM_ERROR: u8 = 1 << 6;

    /// R1's MSB is always 0; bytes with the MSB set are not an R1 token
    /// yet (the driver is still waiting for the card to respond).
    pub fn is_valid_token(byte: u8) -> bool {
        byte & 0x80 == 0
    }

    pub fn is_idle(&self) -> bool {
        self.0 & Self::IDLE != 0
    }

    pub fn has_error(&self) -> bool {
        self.0 & (Self::ERASE_RESET
            | Self::ILLEGAL_COMMAND
            | Self::CRC_ERROR
            | Self::ERASE_SEQ_ERROR
            | Self::ADDRESS_ERROR
            | Self::PARAM_ERROR)
            != 0
    }
}

/// Start-block token preceding a single-block read/write payload.
pub const TOKEN_START_BLOCK: u8 = 0xFE;
/// Start-block token preceding each block of a multi-block write.
pub const TOKEN_START_BLOCK_MULTI: u8 = 0xFC;
/// Stop-transmission token closing a multi-block write.
pub const TOKEN_STOP_TRAN: u8 = 0xFD;

/// Masks a data-response token's low 5 bits; `0b00101` means accepted.
pub const DATA_RESPONSE_MASK: u8 = 0x1F;
pub const DATA_RESPONSE_ACCEPTED: u8 = 0b00101;

pub fn data_response_accepted(token: u8) -> bool {
    token & DATA_RESPONSE_MASK == DATA_RESPONSE_ACCEPTED
}

/// A byte with the MSB set (0xFF on a released MISO line with pull-ups)
/// means the card is not asserting busy.
pub fn is_card_ready(byte: u8) -> bool {
    byte == 0xFF
}
