//! uFAT: a minimalist FAT32-compatible, append-only, multi-log filesystem
//! for raw SD storage.
//!
//! uFAT trades FAT32's generality for a layout a tiny MCU can format and
//! append to cheaply: a fixed number of logs, each a single pre-allocated
//! contiguous extent, opened once and only ever appended to. Reading
//! arbitrary files, random writes and MMC/standard-capacity cards are
//! explicitly not supported; a host OS can still mount the volume
//! read-only because the on-disk structures are valid FAT32.

#![no_std]

#[cfg(not(target_endian = "little"))]
compile_error!("uFAT's on-disk structures are little-endian only");

pub mod block;
pub mod bpb;
pub mod error;
pub mod fat;
pub mod format;
pub mod log;
pub mod mbr;
pub mod mount;
pub mod root;
pub mod types;

pub use block::BlockDevice;
pub use error::Error;
pub use log::LogWriter;
pub use types::{LogEntry, VolumeDescriptor};
