//! Error kinds, per spec §7.
//!
//! `ResourceExhausted` is the "fatal" class: the source unwinds to the
//! front-end via a non-local jump on out-of-space conditions. Here that
//! unwind is just an `Err` value — the public entry point (one of the three
//! binaries) converts any `Err` into a process exit status, so no intra-core
//! recovery is required (see spec §9, "Fatal exceptions").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("inode number {0} out of range")]
    InvalidInode(u32),

    #[error("block number {0} is not a valid data block")]
    InvalidBlock(u32),

    #[error("path component is empty")]
    EmptyComponent,

    #[error("cannot unlink '.' or '..'")]
    UnlinkDotOrDotDot,

    #[error("operation not permitted on a device file")]
    IsDevice,

    #[error("file offset or size overflows")]
    SizeOverflow,

    #[error("a directory entry named {0:?} already exists")]
    NameExists(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("directory is not empty: {0}")]
    NotEmpty(String),

    #[error("path already exists: {0}")]
    AlreadyExists(String),

    #[error("mismatched file types for {0}")]
    TypeMismatch(String),

    #[error("no free inodes")]
    NoFreeInodes,

    #[error("no free data blocks")]
    NoFreeBlocks,

    #[error("invalid superblock: bad magic or inconsistent region sizes")]
    InvalidSuperblock,

    #[error("cannot operate on the root inode")]
    IsRoot,

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
