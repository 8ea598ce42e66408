//! Synthetic FAT12 image builder shared by the scenario tests.

use fat12_engine::geometry::{Bpb, Geometry};

pub const ROOT_ENTRIES: u16 = 16;
pub const CLUSTER_COUNT: usize = 32;

pub fn fresh_image() -> Vec<u8> {
    let bpb = Bpb {
        bytes_per_sector: 512,
        sectors_per_cluster: 1,
        reserved_sector_count: 1,
        num_fats: 2,
        root_entry_count: ROOT_ENTRIES,
        total_sectors_16: 0,
        sectors_per_fat: 1,
        total_sectors_32: 0,
    };
    let geometry = Geometry::new(bpb);
    let data_start_sector = geometry.data_area_offset() / geometry.bytes_per_sector();
    let total_sectors = data_start_sector + CLUSTER_COUNT;

    let bpb = Bpb {
        total_sectors_16: total_sectors as u16,
        ..bpb
    };
    let geometry = Geometry::new(bpb);
    vec![0u8; total_sectors * geometry.bytes_per_sector()]
}
