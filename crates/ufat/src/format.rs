//! Lays down a fresh volume: MBR, primary and backup boot sector, FAT,
//! and root directory, with every log's cluster chain fully linked up
//! front so appends never need to touch the FAT again.

use crate::bpb::{self, BiosParameterBlock};
use crate::error::Error;
use crate::fat;
use crate::mbr;
use crate::root;
use crate::types::{
    VolumeDescriptor, CLUSTER_SIZE, LOG_OFFSET_CLUSTER, MAX_LOGS, PARTITION_START_SECTOR,
    ROOT_CLUSTER, SECTORS_PER_CLUSTER,
};
use crate::BlockDevice;

/// Clusters are handed out in multiples of this so a log's first cluster
/// always starts on a FAT-sector boundary.
const CLUSTER_GRANULARITY: u32 = fat::ENTRIES_PER_SECTOR;

/// Formats `device`, a card of `card_capacity_sectors` sectors, into
/// `num_logs` equally sized logs. Returns the resulting volume
/// descriptor with every log's chain already linked and its size set to
/// zero.
pub fn format<D: BlockDevice>(
    device: &mut D,
    card_capacity_sectors: u64,
    num_logs: u8,
) -> Result<VolumeDescriptor, Error> {
    assert!(num_logs as usize <= MAX_LOGS);

    let partition_size_sectors =
        (card_capacity_sectors - PARTITION_START_SECTOR as u64) as u32;
    let geometry = Geometry::for_partition(partition_size_sectors, num_logs);
    let Geometry { sectors_per_fat, cluster_begin_sector, total_clusters, log_size_clusters } = geometry;

    let mut sector = [0u8; 512];

    mbr::build(card_capacity_sectors, &mut sector);
    device.write_sector(0, &sector)?;

    let bpb_data = BiosParameterBlock {
        hidden_sectors: PARTITION_START_SECTOR,
        total_sectors: partition_size_sectors,
        sectors_per_fat,
        volume_id: volume_id_from_capacity(card_capacity_sectors),
    };
    bpb::build(&bpb_data, &mut sector);
    device.write_sector(PARTITION_START_SECTOR, &sector)?;
    device.write_sector(PARTITION_START_SECTOR + bpb::BACKUP_BOOT_SECTOR_OFFSET, &sector)?;

    let fat1_sector = PARTITION_START_SECTOR + crate::types::RESERVED_SECTORS;
    write_fat(device, fat1_sector, num_logs, log_size_clusters)?;

    root::build(num_logs, log_size_clusters, &mut sector);
    let root_sector = cluster_begin_sector + (ROOT_CLUSTER - ROOT_CLUSTER) * SECTORS_PER_CLUSTER;
    device.write_sector(root_sector, &sector)?;

    Ok(VolumeDescriptor {
        card_capacity_sectors,
        partition_start_sector: PARTITION_START_SECTOR,
        partition_size_sectors,
        fat1_sector,
        cluster_begin_sector,
        sectors_per_cluster: SECTORS_PER_CLUSTER,
        root_cluster: ROOT_CLUSTER,
        total_clusters,
        log_count: num_logs,
        log_start_cluster: LOG_OFFSET_CLUSTER,
        log_size_clusters,
        log_size_bytes: log_size_clusters * CLUSTER_SIZE,
        fs_available: true,
    })
}

fn fat_sectors_for(highest_cluster: u32) -> u32 {
    (highest_cluster + fat::ENTRIES_PER_SECTOR - 1) / fat::ENTRIES_PER_SECTOR
}

/// The cluster accounting `format` needs before it can write anything,
/// pulled out so it can be checked against the original's two-stage
/// computation (`ufat.c:1076`, `ufat.c:1457`) without formatting a card.
struct Geometry {
    sectors_per_fat: u32,
    cluster_begin_sector: u32,
    total_clusters: u32,
    log_size_clusters: u32,
}

impl Geometry {
    fn for_partition(partition_size_sectors: u32, num_logs: u8) -> Geometry {
        // Sized from the whole partition, not from the eventual log layout:
        // a generous over-approximation, so the FAT is guaranteed to cover
        // every cluster the corrected `total_clusters` below can hand out.
        let sectors_per_fat = fat_sectors_for(partition_size_sectors / SECTORS_PER_CLUSTER);
        let cluster_begin_sector = PARTITION_START_SECTOR
            + crate::types::RESERVED_SECTORS
            + sectors_per_fat * crate::types::NUM_FATS;

        let total_clusters = (partition_size_sectors - (cluster_begin_sector - PARTITION_START_SECTOR))
            / SECTORS_PER_CLUSTER;
        let usable_clusters = total_clusters.saturating_sub(LOG_OFFSET_CLUSTER);
        let mut log_size_clusters = (usable_clusters / num_logs.max(1) as u32 / CLUSTER_GRANULARITY)
            * CLUSTER_GRANULARITY;
        if log_size_clusters == 0 {
            log_size_clusters = CLUSTER_GRANULARITY;
        }

        Geometry { sectors_per_fat, cluster_begin_sector, total_clusters, log_size_clusters }
    }
}

fn volume_id_from_capacity(card_capacity_sectors: u64) -> u32 {
    (card_capacity_sectors as u32) ^ 0x5344_4c4f
}

/// Writes the FAT: reserved entries 0-1, the single-cluster root chain,
/// and each log's contiguous chain fully linked end to end.
fn write_fat<D: BlockDevice>(
    device: &mut D,
    fat1_sector: u32,
    num_logs: u8,
    log_size_clusters: u32,
) -> Result<(), Error> {
    let mut sector = [0u8; 512];
    let mut current_fat_sector = u32::MAX;

    let mut set = |device: &mut D, sector_buf: &mut [u8; 512], current: &mut u32, cluster: u32, value: u32| -> Result<(), Error> {
        let (rel_sector, offset) = fat::locate(cluster);
        if *current != rel_sector {
            if *current != u32::MAX {
                device.write_sector(fat1_sector + *current, sector_buf)?;
            }
            sector_buf.fill(0);
            *current = rel_sector;
        }
        fat::write_entry(sector_buf, offset, value);
        Ok(())
    };

    set(device, &mut sector, &mut current_fat_sector, 0, 0x0FFF_FFF8)?;
    set(device, &mut sector, &mut current_fat_sector, 1, 0x0FFF_FFFF)?;
    set(device, &mut sector, &mut current_fat_sector, ROOT_CLUSTER, fat::EOC)?;

    for i in 0..num_logs as u32 {
        let start = LOG_OFFSET_CLUSTER + i * log_size_clusters;
        for c in start..start + log_size_clusters - 1 {
            set(device, &mut sector, &mut current_fat_sector, c, c + 1)?;
        }
        set(
            device,
            &mut sector,
            &mut current_fat_sector,
            start + log_size_clusters - 1,
            fat::EOC,
        )?;
    }

    if current_fat_sector != u32::MAX {
        device.write_sector(fat1_sector + current_fat_sector, &sector)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::MemoryCard;

    #[test]
    fn format_links_every_log_chain_to_eoc() {
        let mut card = MemoryCard::new(200_000);
        let desc = format(&mut card, 200_000, 4).unwrap();
        assert_eq!(desc.log_count, 4);
        assert!(desc.log_size_clusters > 0);

        for log in 0..4u32 {
            let start = desc.log_start_cluster + log * desc.log_size_clusters;
            let mut cluster = start;
            let mut hops = 0;
            loop {
                let (rel, offset) = fat::locate(cluster);
                let mut sector_buf = [0u8; 512];
                card.read_sector(desc.fat1_sector + rel, &mut sector_buf).unwrap();
                let entry = fat::read_entry(&sector_buf, offset);
                hops += 1;
                match entry.status() {
                    crate::fat::Status::Eoc => break,
                    crate::fat::Status::Data(next) => cluster = next,
                    other => panic!("unexpected status {:?}", other),
                }
                assert!(hops <= desc.log_size_clusters);
            }
            assert_eq!(hops, desc.log_size_clusters);
        }
    }

    /// The card from the review: large enough that `RESERVED_SECTORS +
    /// sectors_per_fat` eats past the headroom `LOG_OFFSET_CLUSTER`
    /// bakes in, so a `total_clusters` derived from the raw partition
    /// size (ignoring that overhead) would hand out log extents that
    /// run past the end of the card.
    #[test]
    fn large_card_keeps_every_log_extent_in_bounds() {
        const CARD_CAPACITY_SECTORS: u32 = 250_069_680;
        let partition_size_sectors = CARD_CAPACITY_SECTORS - PARTITION_START_SECTOR;

        for num_logs in [1u8, 4u8] {
            let geometry = Geometry::for_partition(partition_size_sectors, num_logs);
            let last_cluster =
                LOG_OFFSET_CLUSTER + num_logs as u32 * geometry.log_size_clusters - 1;
            let last_sector = geometry.cluster_begin_sector
                + (last_cluster - ROOT_CLUSTER) * SECTORS_PER_CLUSTER
                + (SECTORS_PER_CLUSTER - 1);
            assert!(
                last_sector < CARD_CAPACITY_SECTORS,
                "num_logs={num_logs}: last log sector {last_sector} exceeds card capacity {CARD_CAPACITY_SECTORS}"
            );
            assert!(LOG_OFFSET_CLUSTER + num_logs as u32 * geometry.log_size_clusters <= geometry.total_clusters);
        }
    }

    /// `total_clusters` must come out smaller than the naive
    /// `partition_size_sectors / SECTORS_PER_CLUSTER`, since it has to
    /// account for the reserved area and the FAT sitting in front of it.
    #[test]
    fn total_clusters_accounts_for_reserved_and_fat_overhead() {
        let partition_size_sectors = 250_069_680 - PARTITION_START_SECTOR;
        let geometry = Geometry::for_partition(partition_size_sectors, 4);
        let naive_total_clusters = partition_size_sectors / SECTORS_PER_CLUSTER;
        assert!(geometry.total_clusters < naive_total_clusters);
    }
}
