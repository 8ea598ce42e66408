//! Error taxonomy for the FAT12 engine.
//!
//! Every fallible operation in this crate returns [`FsError`]; nothing is
//! signalled through sentinel return values or raw integer codes.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("image is not a valid FAT12 volume")]
    NotAFat12Volume,

    #[error("name did not resolve to an entry")]
    NotFound,

    #[error("entry is not a directory")]
    NotADirectory,

    #[error("entry is not a file")]
    NotAFile,

    #[error("a sibling entry with that name already exists")]
    NameExists,

    #[error("no free cluster remains on the volume")]
    VolumeFull,

    #[error("the root directory has no free slot")]
    RootDirectoryFull,

    #[error("directory is not empty")]
    NotEmpty,

    #[error("chain walk encountered a defective cluster")]
    DefectiveCluster,

    #[error("cluster chain is corrupt")]
    ChainCorrupt,

    #[error("invalid argument")]
    InvalidArgument,
}

pub type FsResult<T> = Result<T, FsError>;
