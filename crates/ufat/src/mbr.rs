//! The master boot record written at sector 0: a single partition entry
//! of type `0x0B` (FAT32, CHS) spanning from [`crate::types::PARTITION_START_SECTOR`]
//! to the end of the card.

use crate::error::Error;
use crate::types::PARTITION_START_SECTOR;

pub const PARTITION_TYPE_FAT32: u8 = 0x0B;
const SIGNATURE: [u8; 2] = [0x55, 0xAA];

#[derive(Debug, Clone, Copy)]
pub struct PartitionEntry {
    pub partition_type: u8,
    pub lba_start: u32,
    pub num_sectors: u32,
}

impl PartitionEntry {
    fn write_to(&self, out: &mut [u8]) {
        out[0] = 0x00; // not bootable
        out[1..4].copy_from_slice(&[0xFE, 0xFF, 0xFF]); // CHS unused, host reads LBA
        out[4] = self.partition_type;
        out[5..8].copy_from_slice(&[0xFE, 0xFF, 0xFF]);
        out[8..12].copy_from_slice(&self.lba_start.to_le_bytes());
        out[12..16].copy_from_slice(&self.num_sectors.to_le_bytes());
    }

    fn read_from(bytes: &[u8]) -> Self {
        PartitionEntry {
            partition_type: bytes[4],
            lba_start: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            num_sectors: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
        }
    }
}

/// Builds the sector-0 MBR image for a card of `capacity_sectors` sectors.
pub fn build(capacity_sectors: u64, buf: &mut [u8; 512]) {
    buf.fill(0);
    let entry = PartitionEntry {
        partition_type: PARTITION_TYPE_FAT32,
        lba_start: PARTITION_START_SECTOR,
        num_sectors: (capacity_sectors - PARTITION_START_SECTOR as u64) as u32,
    };
    entry.write_to(&mut buf[446..462]);
    buf[510..512].copy_from_slice(&SIGNATURE);
}

/// Parses and validates the sector-0 MBR, returning partition 0.
pub fn parse(buf: &[u8; 512]) -> Result<PartitionEntry, Error> {
    if buf[510..512] != SIGNATURE {
        return Err(Error::FsUnavailable);
    }
    let entry = PartitionEntry::read_from(&buf[446..462]);
    if entry.partition_type != PARTITION_TYPE_FAT32 {
        return Err(Error::FsUnavailable);
    }
    Ok(entry)
}
