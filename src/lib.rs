//! A FAT12 filesystem engine operating on an in-memory image buffer.
//!
//! The engine never touches a disk or clock directly: callers hand it a
//! `&mut [u8]` already holding a FAT12 volume image, and get back a
//! [`volume::Fat12Volume`] exposing `ls`/`cd`/`cat`/`touch`/`append`/
//! `mkdir`/`rm`/`rmdir`. Reading the image from a file, and writing it
//! back out, is the caller's job — see `src/bin/fatsh.rs` for the
//! reference CLI wrapper.

pub mod alloc_table;
pub mod dir;
pub mod entry;
pub mod error;
pub mod geometry;
pub mod name;
pub mod volume;

#[cfg(test)]
mod testutil;

pub use error::{FsError, FsResult};
pub use volume::{Fat12Volume, LsEntry};
