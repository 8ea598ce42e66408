//! Path-scoped filesystem operations composed from the lower layers
//! (§4.7): `ls`, `cd`, `cat`, `touch`, `append`, `mkdir`, `rm`, `rmdir`.
//!
//! [`Fat12Volume`] is the engine's single entry point: it borrows the
//! caller's image buffer for its whole lifetime and carries the
//! process-wide current-directory handle described in §9.

use crate::alloc_table::{self, END_OF_CHAIN};
use crate::dir::{self, Dir, DirLoc};
use crate::entry::{ATTR_DIRECTORY, ATTR_READ_ONLY, ATTR_VOLUME_ID};
use crate::error::{FsError, FsResult};
use crate::geometry::Geometry;
use crate::name;

/// The process-wide current-directory handle (§3 "Ownership and
/// lifecycle", §9 "current directory → explicit context").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrentDir {
    Root,
    Sub { first_cluster: u16, depth: usize },
}

/// One entry as returned by [`Fat12Volume::ls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsEntry {
    pub name: String,
    pub is_dir: bool,
    /// `.` or `..` — counted by callers that need "non-link entries".
    pub is_link: bool,
}

pub struct Fat12Volume<'a> {
    image: &'a mut [u8],
    geometry: Geometry,
    current: CurrentDir,
}

impl<'a> Fat12Volume<'a> {
    /// Mounts `image`, rejecting anything that isn't a FAT12 volume
    /// (§4.8). The current directory starts at root.
    pub fn mount(image: &'a mut [u8]) -> FsResult<Self> {
        let geometry = Geometry::require_fat12(image)?;
        log::debug!(
            "mounted FAT12 volume: {} clusters, {} bytes/cluster",
            geometry.count_of_clusters(),
            geometry.bytes_per_cluster()
        );
        Ok(Fat12Volume {
            image,
            geometry,
            current: CurrentDir::Root,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Validates the current-directory handle against live storage and
    /// returns the `Dir` it resolves to, resetting to root on staleness
    /// (§9 open question 4). A directory's own first cluster must still
    /// hold a `.` entry naming itself; anything else means the directory
    /// was removed (or its storage reused) since we navigated into it.
    fn current_dir(&mut self) -> Dir {
        match self.current {
            CurrentDir::Root => Dir::Root,
            CurrentDir::Sub { first_cluster, .. } => {
                let dot = dir::entry_at(self.image, &self.geometry, DirLoc {
                    dir: Dir::Sub(first_cluster),
                    cluster: first_cluster,
                    slot: 0,
                });
                if dot.is_dot() && dot.first_cluster() == first_cluster {
                    Dir::Sub(first_cluster)
                } else {
                    log::warn!("current directory handle is stale, resetting to root");
                    self.current = CurrentDir::Root;
                    Dir::Root
                }
            }
        }
    }

    /// Depth of the current directory below root — `0` at root, `1` in a
    /// direct child, and so on. Used only by `pwd` in the CLI wrapper.
    pub fn current_depth(&self) -> usize {
        match self.current {
            CurrentDir::Root => 0,
            CurrentDir::Sub { depth, .. } => depth,
        }
    }

    fn resolve(&mut self, name: &str) -> FsResult<Option<DirLoc>> {
        let dir = self.current_dir();
        let normalized = name::normalize(name);
        dir::resolve(self.image, &self.geometry, dir, &normalized)
    }

    /// §4.7 `ls()`.
    pub fn ls(&mut self) -> FsResult<Vec<LsEntry>> {
        let dir = self.current_dir();
        let locs = dir::list_entries(self.image, &self.geometry, dir, true)?;
        Ok(locs
            .into_iter()
            .map(|loc| {
                let entry = dir::entry_at(self.image, &self.geometry, loc);
                LsEntry {
                    name: name::display(&entry.name()),
                    is_dir: entry.is_dir(),
                    is_link: entry.is_dot() || entry.is_dotdot(),
                }
            })
            .collect())
    }

    /// §4.7 `cd(name)`.
    pub fn cd(&mut self, name: &str) -> FsResult<()> {
        let normalized = name::normalize(name);
        let loc = self.resolve(name)?.ok_or(FsError::NotFound)?;
        let entry = dir::entry_at(self.image, &self.geometry, loc);
        if !entry.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let target_cluster = entry.first_cluster();
        let current_depth = self.current_depth();
        self.current = if target_cluster == 0 {
            CurrentDir::Root
        } else {
            let depth = if normalized == name::normalize("..") {
                current_depth.saturating_sub(1)
            } else if normalized == name::normalize(".") {
                current_depth
            } else {
                current_depth + 1
            };
            CurrentDir::Sub {
                first_cluster: target_cluster,
                depth,
            }
        };
        Ok(())
    }

    /// §4.7 `cat(name)`.
    pub fn cat(&mut self, name: &str) -> FsResult<Vec<u8>> {
        let loc = self.resolve(name)?.ok_or(FsError::NotFound)?;
        let entry = dir::entry_at(self.image, &self.geometry, loc);
        if entry.is_dir() {
            return Err(FsError::NotAFile);
        }
        let first_cluster = entry.first_cluster();
        let file_size = entry.file_size() as usize;
        if first_cluster == 0 {
            return Ok(Vec::new());
        }

        let chain = alloc_table::follow(self.image, &self.geometry, first_cluster)?;
        let mut out = Vec::with_capacity(file_size);
        for cluster in chain {
            let offset = self.geometry.cluster_offset(cluster);
            let remaining = file_size.saturating_sub(out.len());
            let take = remaining.min(self.geometry.bytes_per_cluster());
            out.extend_from_slice(&self.image[offset..offset + take]);
        }
        Ok(out)
    }

    /// §4.7 `touch(name)`. Idempotent: re-touching an existing name is a
    /// successful no-op rather than `NameExists` (only `mkdir` enforces
    /// that).
    pub fn touch(&mut self, name: &str) -> FsResult<()> {
        if name.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        if self.resolve(name)?.is_some() {
            return Ok(());
        }

        let dir = self.current_dir();
        let normalized = name::normalize(name);
        let slot = dir::find_free_slot(self.image, &self.geometry, dir)?;
        let first_cluster = alloc_table::allocate(self.image, &self.geometry, 0)?;
        let mut entry = dir::entry_at_mut(self.image, &self.geometry, slot);
        entry.init(&normalized, 0, first_cluster);
        Ok(())
    }

    /// §4.7 `append(name, bytes)`.
    pub fn append(&mut self, name: &str, bytes: &[u8]) -> FsResult<()> {
        self.touch(name)?;
        let loc = self.resolve(name)?.ok_or(FsError::NotFound)?;
        let entry = dir::entry_at(self.image, &self.geometry, loc);
        let first_cluster = entry.first_cluster();
        let old_size = entry.file_size() as usize;

        let cluster_size = self.geometry.bytes_per_cluster();
        let mut tail = alloc_table::last_cluster(self.image, &self.geometry, first_cluster)?;
        let mut offset_in_cluster = old_size % cluster_size;
        let mut written = 0usize;

        while written < bytes.len() {
            let space_left = cluster_size - offset_in_cluster;
            let take = space_left.min(bytes.len() - written);
            let dst_offset = self.geometry.cluster_offset(tail) + offset_in_cluster;
            self.image[dst_offset..dst_offset + take]
                .copy_from_slice(&bytes[written..written + take]);
            written += take;
            offset_in_cluster += take;

            if written < bytes.len() {
                tail = alloc_table::allocate(self.image, &self.geometry, tail)?;
                offset_in_cluster = 0;
            }
        }

        let mut entry = dir::entry_at_mut(self.image, &self.geometry, loc);
        entry.set_file_size((old_size + bytes.len()) as u32);
        Ok(())
    }

    /// §4.7 `mkdir(name)`. Enumerates numeric-tail candidates before
    /// failing `NameExists` (§9 open question 3); a name that needs no
    /// tail has exactly one candidate, so it fails immediately like a
    /// plain duplicate-name rejection.
    pub fn mkdir(&mut self, name: &str) -> FsResult<()> {
        if name.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        let dir = self.current_dir();
        let candidates = name::normalize_candidates(name);

        let mut chosen = None;
        for candidate in &candidates {
            if dir::resolve(self.image, &self.geometry, dir, candidate)?.is_none() {
                chosen = Some(*candidate);
                break;
            }
        }
        let normalized = chosen.ok_or(FsError::NameExists)?;

        let parent_first_cluster = match dir {
            Dir::Root => 0,
            Dir::Sub(c) => c,
        };

        let slot = dir::find_free_slot(self.image, &self.geometry, dir)?;
        let first_cluster = alloc_table::allocate(self.image, &self.geometry, 0)?;
        {
            let mut entry = dir::entry_at_mut(self.image, &self.geometry, slot);
            entry.init(&normalized, ATTR_DIRECTORY, first_cluster);
        }
        dir::init_dot_entries(self.image, &self.geometry, first_cluster, parent_first_cluster);
        Ok(())
    }

    /// §4.7 `rm(name)`. Refuses read-only/volume-label entries by
    /// bitmask (§9 open question 2; the source tests for exact equality
    /// against a single flag).
    pub fn rm(&mut self, name: &str) -> FsResult<()> {
        let dir = self.current_dir();
        let loc = self.resolve(name)?.ok_or(FsError::NotFound)?;
        let entry = dir::entry_at(self.image, &self.geometry, loc);
        if entry.attr() & (ATTR_READ_ONLY | ATTR_VOLUME_ID) != 0 {
            return Err(FsError::NotFound);
        }
        let first_cluster = entry.first_cluster();

        if first_cluster != 0 {
            alloc_table::free_chain(self.image, &self.geometry, first_cluster)?;
        }
        let mut entry = dir::entry_at_mut(self.image, &self.geometry, loc);
        entry.mark_free();

        dir::collapse_trailing_clusters(self.image, &self.geometry, dir)?;
        Ok(())
    }

    /// §4.7 `rmdir(name)`.
    pub fn rmdir(&mut self, name: &str) -> FsResult<()> {
        let normalized = name::normalize(name);
        if normalized == name::normalize(".") || normalized == name::normalize("..") {
            return Err(FsError::NotFound);
        }

        let dir = self.current_dir();
        let loc = self.resolve(name)?.ok_or(FsError::NotFound)?;
        let entry = dir::entry_at(self.image, &self.geometry, loc);
        if !entry.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let target_cluster = entry.first_cluster();
        if !dir::is_empty(self.image, &self.geometry, Dir::Sub(target_cluster))? {
            return Err(FsError::NotEmpty);
        }

        alloc_table::free_chain(self.image, &self.geometry, target_cluster)?;
        let mut entry = dir::entry_at_mut(self.image, &self.geometry, loc);
        entry.mark_free();
        dir::collapse_trailing_clusters(self.image, &self.geometry, dir)?;
        Ok(())
    }
}

/// Re-marks a chain's tail as end-of-chain without freeing anything; not
/// part of the public surface, used by `collapse_trailing_clusters`'s
/// callers indirectly through `dir`. Kept here only as a reminder that
/// `END_OF_CHAIN` is a `volume`-level concept shared with `alloc_table`.
#[allow(dead_code)]
const _USES_END_OF_CHAIN: u16 = END_OF_CHAIN;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fresh_image;

    #[test]
    fn touch_then_cat_yields_empty_file() {
        let (mut image, _geometry) = fresh_image();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.touch("file.txt").unwrap();
        assert_eq!(volume.cat("file.txt").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn touch_is_idempotent() {
        let (mut image, _geometry) = fresh_image();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.touch("file.txt").unwrap();
        volume.touch("file.txt").unwrap();
        assert_eq!(volume.ls().unwrap().len(), 1);
    }

    #[test]
    fn append_spanning_two_clusters() {
        let (mut image, geometry) = fresh_image();
        let cluster_size = geometry.bytes_per_cluster();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.touch("file.txt").unwrap();
        let payload = vec![b'y'; cluster_size + 2];
        volume.append("file.txt", &payload).unwrap();
        assert_eq!(volume.cat("file.txt").unwrap(), payload);
    }

    #[test]
    fn mkdir_cd_and_back() {
        let (mut image, _geometry) = fresh_image();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.mkdir("folder1").unwrap();
        volume.cd("folder1").unwrap();
        volume.touch("inner.txt").unwrap();
        assert_eq!(
            volume.ls().unwrap().iter().filter(|e| !e.is_link).count(),
            1
        );
        volume.cd("..").unwrap();
        assert_eq!(volume.ls().unwrap().len(), 1);
    }

    #[test]
    fn rmdir_refuses_non_empty_directory() {
        let (mut image, _geometry) = fresh_image();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.mkdir("folder1").unwrap();
        volume.cd("folder1").unwrap();
        volume.touch("inner.txt").unwrap();
        volume.cd("..").unwrap();
        assert_eq!(volume.rmdir("folder1"), Err(FsError::NotEmpty));
    }

    #[test]
    fn mkdir_then_rmdir_empties_directory_slot() {
        let (mut image, _geometry) = fresh_image();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        volume.mkdir("folder1").unwrap();
        volume.rmdir("folder1").unwrap();
        assert_eq!(volume.ls().unwrap().len(), 0);
    }

    #[test]
    fn volume_full_leaves_ls_unaffected() {
        let (mut image, geometry) = fresh_image();
        let cluster_count = geometry.count_of_clusters();
        let mut volume = Fat12Volume::mount(&mut image).unwrap();
        // Create inside a subdirectory, whose chain can grow without the
        // root directory's fixed slot count getting in the way first.
        volume.mkdir("sink").unwrap();
        volume.cd("sink").unwrap();
        for i in 0..cluster_count {
            let name = format!("f{i}.txt");
            if volume.touch(&name).is_err() {
                break;
            }
        }
        let before = volume.ls().unwrap().len();
        assert_eq!(volume.touch("overflow.txt"), Err(FsError::VolumeFull));
        assert_eq!(volume.ls().unwrap().len(), before);
    }
}
