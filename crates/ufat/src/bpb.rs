//! The FAT32 boot sector (BIOS Parameter Block), written at the start of
//! the partition and mirrored to a backup sector six sectors later.

use crate::error::Error;
use crate::types::{NUM_FATS, RESERVED_SECTORS, ROOT_CLUSTER, SECTORS_PER_CLUSTER};

pub const FS_TYPE: [u8; 8] = *b"FAT32   ";
const SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const BACKUP_BOOT_SECTOR_OFFSET: u32 = 6;
pub const FSINFO_SECTOR: u16 = 1;

#[derive(Debug, Clone, Copy)]
pub struct BiosParameterBlock {
    pub hidden_sectors: u32,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    pub volume_id: u32,
}

pub fn build(bpb: &BiosParameterBlock, buf: &mut [u8; 512]) {
    buf.fill(0);
    buf[0] = 0xEB;
    buf[1] = 0x58;
    buf[2] = 0x90;
    buf[3..11].copy_from_slice(b"UFATFW  ");
    buf[11..13].copy_from_slice(&512u16.to_le_bytes());
    buf[13] = SECTORS_PER_CLUSTER as u8;
    buf[14..16].copy_from_slice(&(RESERVED_SECTORS as u16).to_le_bytes());
    buf[16] = NUM_FATS as u8;
    buf[21] = 0xF8; // media descriptor: fixed disk
    buf[28..32].copy_from_slice(&bpb.hidden_sectors.to_le_bytes());
    buf[32..36].copy_from_slice(&bpb.total_sectors.to_le_bytes());
    buf[36..40].copy_from_slice(&bpb.sectors_per_fat.to_le_bytes());
    buf[44..48].copy_from_slice(&ROOT_CLUSTER.to_le_bytes());
    buf[48..50].copy_from_slice(&FSINFO_SECTOR.to_le_bytes());
    buf[50..52].copy_from_slice(&(BACKUP_BOOT_SECTOR_OFFSET as u16).to_le_bytes());
    buf[64] = 0x80; // drive number
    buf[66] = 0x29; // extended boot signature
    buf[67..71].copy_from_slice(&bpb.volume_id.to_le_bytes());
    buf[71..82].copy_from_slice(b"UFAT VOL   ");
    buf[82..90].copy_from_slice(&FS_TYPE);
    buf[510..512].copy_from_slice(&SIGNATURE);
}

pub fn parse(buf: &[u8; 512]) -> Result<BiosParameterBlock, Error> {
    if buf[510..512] != SIGNATURE || buf[82..90] != FS_TYPE {
        return Err(Error::FsUnavailable);
    }
    if buf[13] as u32 != SECTORS_PER_CLUSTER || buf[16] as u32 != NUM_FATS {
        return Err(Error::FsUnavailable);
    }
    Ok(BiosParameterBlock {
        hidden_sectors: u32::from_le_bytes(buf[28..32].try_into().unwrap()),
        total_sectors: u32::from_le_bytes(buf[32..36].try_into().unwrap()),
        sectors_per_fat: u32::from_le_bytes(buf[36..40].try_into().unwrap()),
        volume_id: u32::from_le_bytes(buf[67..71].try_into().unwrap()),
    })
}
