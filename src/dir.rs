//! Directory entry scanner and name resolver.
//!
//! The root directory is a flat, fixed-size table; a subdirectory is a
//! cluster chain. Both speak the same slot protocol — `0x00` ends the
//! directory, `0xE5` marks a free slot to skip — so the scanner exposes
//! one iteration rule over either storage discipline.

use crate::alloc_table::{self, END_OF_CHAIN};
use crate::entry::{DirEntry, DirEntryMut, ATTR_DIRECTORY, DIR_ENTRY_LEN};
use crate::error::{FsError, FsResult};
use crate::geometry::Geometry;
use crate::name::ShortName;

/// Which storage discipline a directory uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Root,
    Sub(u16),
}

/// The physical location of one directory-entry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirLoc {
    pub dir: Dir,
    /// Cluster the slot lives in; meaningless (and unused) for `Dir::Root`.
    pub cluster: u16,
    pub slot: usize,
}

impl DirLoc {
    fn root(slot: usize) -> Self {
        DirLoc {
            dir: Dir::Root,
            cluster: 0,
            slot,
        }
    }

    fn sub(cluster: u16, slot: usize) -> Self {
        DirLoc {
            dir: Dir::Sub(cluster),
            cluster,
            slot,
        }
    }

    pub fn byte_offset(&self, geometry: &Geometry) -> usize {
        match self.dir {
            Dir::Root => geometry.root_dir_offset() + self.slot * DIR_ENTRY_LEN,
            Dir::Sub(_) => geometry.cluster_offset(self.cluster) + self.slot * DIR_ENTRY_LEN,
        }
    }
}

fn entries_per_cluster(geometry: &Geometry) -> usize {
    geometry.bytes_per_cluster() / DIR_ENTRY_LEN
}

pub fn entry_at<'a>(image: &'a [u8], geometry: &Geometry, loc: DirLoc) -> DirEntry<'a> {
    let offset = loc.byte_offset(geometry);
    DirEntry::from_slice(&image[offset..offset + DIR_ENTRY_LEN])
}

pub fn entry_at_mut<'a>(
    image: &'a mut [u8],
    geometry: &Geometry,
    loc: DirLoc,
) -> DirEntryMut<'a> {
    let offset = loc.byte_offset(geometry);
    DirEntryMut::from_slice(&mut image[offset..offset + DIR_ENTRY_LEN])
}

/// All slot locations in `dir` up to and including the first end-of-
/// directory marker, in storage order (§4.5 iteration rule).
fn all_slots(image: &[u8], geometry: &Geometry, dir: Dir) -> FsResult<Vec<DirLoc>> {
    let mut slots = Vec::new();
    match dir {
        Dir::Root => {
            for slot in 0..geometry.root_entry_count() {
                slots.push(DirLoc::root(slot));
            }
        }
        Dir::Sub(first_cluster) => {
            let per_cluster = entries_per_cluster(geometry);
            for cluster in alloc_table::follow(image, geometry, first_cluster)? {
                for slot in 0..per_cluster {
                    slots.push(DirLoc::sub(cluster, slot));
                }
            }
        }
    }
    Ok(slots)
}

/// Live (non-free) entries in `dir`, stopping at the end-of-directory
/// sentinel. `include_dots` controls whether `.`/`..` are included.
pub fn list_entries(
    image: &[u8],
    geometry: &Geometry,
    dir: Dir,
    include_dots: bool,
) -> FsResult<Vec<DirLoc>> {
    let mut live = Vec::new();
    for loc in all_slots(image, geometry, dir)? {
        let entry = entry_at(image, geometry, loc);
        if entry.is_end() {
            break;
        }
        if entry.is_free() {
            continue;
        }
        if !include_dots && (entry.is_dot() || entry.is_dotdot()) {
            continue;
        }
        live.push(loc);
    }
    Ok(live)
}

/// True when `dir` contains no entries other than `.`/`..`.
pub fn is_empty(image: &[u8], geometry: &Geometry, dir: Dir) -> FsResult<bool> {
    Ok(list_entries(image, geometry, dir, false)?.is_empty())
}

/// Resolves `name` (already normalized to its 11-byte canonical form) in
/// `dir`, comparing the full name for exact equality (§4.6; the source
/// this is modeled on instead does a prefix match).
pub fn resolve(
    image: &[u8],
    geometry: &Geometry,
    dir: Dir,
    name: &ShortName,
) -> FsResult<Option<DirLoc>> {
    for loc in all_slots(image, geometry, dir)? {
        let entry = entry_at(image, geometry, loc);
        if entry.is_end() {
            break;
        }
        if entry.is_free() {
            continue;
        }
        if &entry.name() == name {
            return Ok(Some(loc));
        }
    }
    Ok(None)
}

/// Finds a free slot to create a new entry in, allocating a new cluster
/// for a subdirectory if its existing chain is full (§4.5).
pub fn find_free_slot(image: &mut [u8], geometry: &Geometry, dir: Dir) -> FsResult<DirLoc> {
    for loc in all_slots(image, geometry, dir)? {
        let entry = entry_at(image, geometry, loc);
        if entry.is_free() || entry.is_end() {
            return Ok(loc);
        }
    }
    match dir {
        Dir::Root => Err(FsError::RootDirectoryFull),
        Dir::Sub(first_cluster) => {
            let new_cluster =
                alloc_table::allocate(image, geometry, first_cluster).map_err(|e| match e {
                    FsError::VolumeFull => FsError::VolumeFull,
                    other => other,
                })?;
            init_directory_cluster(image, geometry, new_cluster);
            Ok(DirLoc::sub(new_cluster, 0))
        }
    }
}

/// Zeroes a freshly allocated directory cluster and marks every slot
/// free, with the directory attribute bit set as a marker (§4.5
/// "Directory cluster initialization" — matches the source's behavior
/// even though ordinary entry creation overwrites it completely).
fn init_directory_cluster(image: &mut [u8], geometry: &Geometry, cluster: u16) {
    let offset = geometry.cluster_offset(cluster);
    let per_cluster = entries_per_cluster(geometry);
    for slot in 0..per_cluster {
        let start = offset + slot * DIR_ENTRY_LEN;
        let region = &mut image[start..start + DIR_ENTRY_LEN];
        region.fill(0);
        region[0] = crate::entry::ENTRY_FREE;
        region[11] = ATTR_DIRECTORY;
    }
}

/// Writes `.` (self) and `..` (parent) into slots 0 and 1 of a newly
/// created directory's first cluster (§4.5).
pub fn init_dot_entries(
    image: &mut [u8],
    geometry: &Geometry,
    first_cluster: u16,
    parent_first_cluster: u16,
) {
    let self_name = crate::name::normalize(".");
    let parent_name = crate::name::normalize("..");

    let mut dot = entry_at_mut(image, geometry, DirLoc::sub(first_cluster, 0));
    dot.init(&self_name, ATTR_DIRECTORY, first_cluster);

    let mut dotdot = entry_at_mut(image, geometry, DirLoc::sub(first_cluster, 1));
    dotdot.init(&parent_name, ATTR_DIRECTORY, parent_first_cluster);
}

/// Walks `dir`'s chain, finds the last cluster that still contains any
/// live entry, re-marks it end-of-chain and frees every cluster after it
/// (§4.7 `collapse_trailing_clusters`). No-op for the root directory.
pub fn collapse_trailing_clusters(image: &mut [u8], geometry: &Geometry, dir: Dir) -> FsResult<()> {
    let first_cluster = match dir {
        Dir::Root => return Ok(()),
        Dir::Sub(c) => c,
    };

    let chain = alloc_table::follow(image, geometry, first_cluster)?;
    let per_cluster = entries_per_cluster(geometry);

    let mut last_live_cluster = chain[0];
    for &cluster in &chain {
        let has_live_entry = (0..per_cluster).any(|slot| {
            let entry = entry_at(image, geometry, DirLoc::sub(cluster, slot));
            !entry.is_free() && !entry.is_end()
        });
        if has_live_entry {
            last_live_cluster = cluster;
        }
    }

    let tail_index = chain.iter().position(|&c| c == last_live_cluster).unwrap();
    alloc_table::write_entry_mirrored(image, geometry, last_live_cluster, END_OF_CHAIN);
    for &cluster in &chain[tail_index + 1..] {
        alloc_table::write_entry_mirrored(image, geometry, cluster, 0x000);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fresh_image;

    #[test]
    fn root_starts_empty() {
        let (image, geometry) = fresh_image();
        let locs = list_entries(&image, &geometry, Dir::Root, true).unwrap();
        assert!(locs.is_empty());
    }

    #[test]
    fn find_free_slot_in_root_returns_first_end_marker() {
        let (mut image, geometry) = fresh_image();
        let loc = find_free_slot(&mut image, &geometry, Dir::Root).unwrap();
        assert_eq!(loc, DirLoc::root(0));
    }
}
