//! Card identification/description registers read back during
//! initialisation: OCR, CID, and the CSD v2 layout this driver requires
//! (CSD v1 / standard-capacity cards are rejected, see [`crate::Error::CardUnsupported`]).

#![allow(non_snake_case)]

use bitfield::bitfield;

bitfield! {
    /// Operation Conditions Register, read back via CMD58.
    #[derive(Copy, Clone)]
    pub struct Ocr(u32);
    impl Debug;

    /// Set once the power-up sequence has completed.
    pub card_power_up_status, _: 31;

    /// 1 for SDHC/SDXC, 0 for standard-capacity.
    pub ccs, _: 30;

    pub u32, voltage_window, _: 23, 0;
}

bitfield! {
    /// Card Identification Register.
    #[derive(Copy, Clone)]
    pub struct Cid(u128);
    impl Debug;

    pub u8, manufacturer_id, _: 127, 120;
    pub u16, oem_id, _: 119, 104;
    pub u64, product_name, _: 103, 64;
    pub u8, product_revision, _: 63, 56;
    pub u32, serial_number, _: 55, 24;
    pub u8, manufacturing_date, _: 19, 8;
    pub u8, crc, _: 7, 1;
}

bitfield! {
    /// CSD version 2.00 (the only version this driver accepts). `C_SIZE`
    /// alone determines capacity: `(C_SIZE + 1) * 1024` 512-byte sectors.
    #[derive(Copy, Clone)]
    pub struct CsdV2(u128);
    impl Debug;

    pub u8, csd_structure, _: 127, 126;
    pub u32, c_size, _: 69, 48;
}

impl CsdV2 {
    /// Card capacity in 512-byte sectors, per the CSD v2 formula.
    pub fn capacity_sectors(&self) -> u64 {
        (self.c_size() as u64 + 1) * 1024
    }
}

/// Card metadata gathered during initialisation.
#[derive(Debug, Clone, Copy)]
pub struct CardDescriptor {
    pub ocr: Ocr,
    pub cid: Cid,
    pub csd: CsdV2,
}

impl CardDescriptor {
    pub fn capacity_sectors(&self) -> u64 {
        self.csd.capacity_sectors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_formula() {
        // 30,277,632 sectors corresponds to C_SIZE = 29567.
        let csd = CsdV2(0);
        let mut raw = csd.0;
        raw |= 29567u128 << 48;
        let csd = CsdV2(raw);
        assert_eq!(csd.capacity_sectors(), 30_277_632);
    }
}
