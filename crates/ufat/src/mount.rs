//! Mounting: read back what `format` wrote and rebuild a
//! [`VolumeDescriptor`] from it, without touching the FAT (already fully
//! linked at format time, so mount never needs to walk it).

use crate::bpb;
use crate::error::Error;
use crate::mbr;
use crate::root;
use crate::types::{VolumeDescriptor, CLUSTER_SIZE, NUM_FATS, RESERVED_SECTORS, ROOT_CLUSTER};
use crate::{BlockDevice, LogEntry};

/// Mounts `device`, reading the MBR, boot sector and root directory
/// back into a [`VolumeDescriptor`] plus the log table. Falls back to
/// the backup boot sector if the primary one fails validation.
pub fn mount<D: BlockDevice>(device: &mut D) -> Result<(VolumeDescriptor, [LogEntry; crate::types::MAX_LOGS]), Error> {
    let card_capacity_sectors = device.capacity_sectors();

    let mut sector = [0u8; 512];
    device.read_sector(0, &mut sector)?;
    let partition = mbr::parse(&sector)?;

    device.read_sector(partition.lba_start, &mut sector)?;
    let parsed_bpb = match bpb::parse(&sector) {
        Ok(parsed) => parsed,
        Err(_) => {
            device.read_sector(partition.lba_start + bpb::BACKUP_BOOT_SECTOR_OFFSET, &mut sector)?;
            bpb::parse(&sector)?
        }
    };

    let fat1_sector = partition.lba_start + RESERVED_SECTORS;
    let cluster_begin_sector = fat1_sector + parsed_bpb.sectors_per_fat * NUM_FATS;
    let sectors_per_cluster = crate::types::SECTORS_PER_CLUSTER;

    device.read_sector(cluster_begin_sector, &mut sector)?;
    let (meta, entries) = root::parse(&sector)?;

    let desc = VolumeDescriptor {
        card_capacity_sectors,
        partition_start_sector: partition.lba_start,
        partition_size_sectors: partition.num_sectors,
        fat1_sector,
        cluster_begin_sector,
        sectors_per_cluster,
        root_cluster: ROOT_CLUSTER,
        total_clusters: (partition.num_sectors - (cluster_begin_sector - partition.lba_start)) / sectors_per_cluster,
        log_count: meta.num_logs,
        log_start_cluster: meta.log_start_cluster,
        log_size_clusters: meta.log_size_clusters,
        log_size_bytes: meta.log_size_clusters * CLUSTER_SIZE,
        fs_available: true,
    };

    Ok((desc, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::MemoryCard;
    use crate::format::format;

    #[test]
    fn mount_recovers_what_format_wrote() {
        let mut card = MemoryCard::new(200_000);
        let formatted = format(&mut card, 200_000, 3).unwrap();

        let (mounted, entries) = mount(&mut card).unwrap();
        assert!(mounted.fs_available);
        assert_eq!(mounted.log_count, 3);
        assert_eq!(mounted.log_start_cluster, formatted.log_start_cluster);
        assert_eq!(mounted.log_size_clusters, formatted.log_size_clusters);
        assert_eq!(mounted.cluster_begin_sector, formatted.cluster_begin_sector);
        assert_eq!(mounted.total_clusters, formatted.total_clusters);
        assert_eq!(entries[0].start_cluster, formatted.log_start_cluster);
    }

    #[test]
    fn mount_rejects_unformatted_card() {
        let mut card = MemoryCard::new(200_000);
        assert!(mount(&mut card).is_err());
    }
}
