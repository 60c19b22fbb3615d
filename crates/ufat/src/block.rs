//! Block-level access to the card, abstracted away from `sd`'s concrete
//! SPI/clock type parameters so the rest of this crate names one trait.

use crate::error::Error;

pub trait BlockDevice {
    fn read_sector(&mut self, sector: u32, buf: &mut [u8; 512]) -> Result<(), Error>;
    fn write_sector(&mut self, sector: u32, buf: &[u8; 512]) -> Result<(), Error>;
    fn erase(&mut self, start_sector: u32, end_sector: u32) -> Result<(), Error>;
    fn capacity_sectors(&self) -> u64;
}

impl<S: sd::spi::SpiBus, C: bsp::Clock> BlockDevice for sd::SdCard<S, C> {
    fn read_sector(&mut self, sector: u32, buf: &mut [u8; 512]) -> Result<(), Error> {
        Ok(self.block_read(sector, buf)?)
    }
    fn write_sector(&mut self, sector: u32, buf: &[u8; 512]) -> Result<(), Error> {
        Ok(self.block_write(sector, buf)?)
    }
    fn erase(&mut self, start_sector: u32, end_sector: u32) -> Result<(), Error> {
        Ok(sd::block::SdCard::erase(self, start_sector, end_sector)?)
    }
    fn capacity_sectors(&self) -> u64 {
        self.descriptor.map(|d| d.capacity_sectors()).unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::BlockDevice;
    use crate::error::Error;

    /// A fully in-memory stand-in for a card, used by format/mount tests
    /// that need to read back what they just wrote without real SPI
    /// hardware.
    pub(crate) struct MemoryCard {
        sectors: Vec<[u8; 512]>,
    }

    impl MemoryCard {
        pub(crate) fn new(capacity_sectors: u64) -> Self {
            MemoryCard { sectors: std::vec![[0u8; 512]; capacity_sectors as usize] }
        }
    }

    impl BlockDevice for MemoryCard {
        fn read_sector(&mut self, sector: u32, buf: &mut [u8; 512]) -> Result<(), Error> {
            buf.copy_from_slice(&self.sectors[sector as usize]);
            Ok(())
        }
        fn write_sector(&mut self, sector: u32, buf: &[u8; 512]) -> Result<(), Error> {
            self.sectors[sector as usize] = *buf;
            Ok(())
        }
        fn erase(&mut self, start_sector: u32, end_sector: u32) -> Result<(), Error> {
            for s in start_sector..end_sector {
                self.sectors[s as usize] = [0u8; 512];
            }
            Ok(())
        }
        fn capacity_sectors(&self) -> u64 {
            self.sectors.len() as u64
        }
    }
}
