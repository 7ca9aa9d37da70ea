//! xv6-riscv file-system-image manipulation, as a library.
//!
//! An [`Image`] wraps the raw bytes of an xv6 disk image (however the
//! caller obtained them — `memmap2::MmapMut`, a `Vec<u8>`, a file read in
//! full) and exposes every layer of the on-disk format: the superblock and
//! derived region layout (`layout`), the free-block bitmap (`bitmap`), the
//! inode table (`inode`), the block map (`bmap`), byte-range read/write
//! (`io`), directory contents (`dir`), path resolution (`path`), a fresh-image
//! builder (`builder`), high-level verbs used by `opfs` (`ops`), and a raw
//! field editor used by `modfs` (`raw`).
//!
//! This crate performs no I/O of its own and holds no locks: it operates on
//! whatever byte slice it is handed, one call at a time, exactly as the
//! binaries built on top of it need.

mod bitmap;
mod bmap;
mod builder;
mod dir;
mod error;
mod image;
mod inode;
mod io;
mod layout;
mod ops;
mod path;
mod raw;
#[cfg(test)]
mod testutil;
mod types;

pub use builder::setupfs;
pub use error::{FsError, Result};
pub use image::{blocks_for_bytes, Image};
pub use ops::{BUFSIZE, DiskInfo, EntryInfo, InodeInfo};
pub use path::{skipelem, splitpath};
pub use raw::{InodeField, SuperField};
pub use types::{
    DInode, Dirent, FileType, SuperBlock, BPB, BSIZE, DIRSIZ, FSMAGIC, IPB, MAXFILE, NDIRECT,
    NINDIRECT, ROOTINO,
};
