//! Image initialization. Grounded on `mkfs/src/main.rs::main` in the
//! teacher, generalized from compile-time constants (`NINODES`, `FSSIZE`,
//! `NLOG`) to runtime arguments, and from manual `wsect`/`rsect` byte
//! shuffling to `Image`'s typed accessors.

use zerocopy::AsBytes;

use crate::error::{FsError, Result};
use crate::image::{blocks_for_bytes, Image};
use crate::types::{FileType, Le32, SuperBlock, BSIZE, FSMAGIC, ROOTINO};

/// Initializes a zeroed image: superblock, reserved-region bitmap, root
/// directory. `data` must already be exactly `size * BSIZE` bytes, as the
/// front-end allocates it (spec §4.9).
pub fn setupfs(data: &mut [u8], size: u32, ninodes: u32, nlog: u32) -> Result<()> {
    if data.len() != size as usize * BSIZE {
        return Err(FsError::InvalidSuperblock);
    }
    data.fill(0);

    let logstart = 2u32;
    let ni_blocks = blocks_for_bytes(ninodes as usize * core::mem::size_of::<crate::types::DInode>())
        .max((ninodes as usize).div_ceil(crate::types::IPB)) as u32;
    let inodestart = logstart + nlog;
    let nm_blocks = (size as usize).div_ceil(crate::types::BPB) as u32;
    let bmapstart = inodestart + ni_blocks;
    if bmapstart + nm_blocks >= size {
        return Err(FsError::InvalidSuperblock);
    }
    let nblocks = size - (bmapstart + nm_blocks);

    let sb = SuperBlock {
        magic: Le32::new(FSMAGIC),
        size: Le32::new(size),
        nblocks: Le32::new(nblocks),
        ninodes: Le32::new(ninodes),
        nlog: Le32::new(nlog),
        logstart: Le32::new(logstart),
        inodestart: Le32::new(inodestart),
        bmapstart: Le32::new(bmapstart),
    };

    let mut img = Image::open_unchecked(data);
    img.write_superblock(&sb);

    // Mark the reserved prefix (boot, superblock, log, inodes, bitmap) used.
    for b in 0..sb.first_data_block() {
        img.bitmap_set(b);
    }

    let rootino = img.ialloc(FileType::Dir)?;
    assert_eq!(rootino, ROOTINO, "setupfs: root inode must be inum 1");

    img.daddent(rootino, b".", rootino)?;
    img.daddent(rootino, b"..", rootino)?;

    Ok(())
}

pub const _: () = assert!(core::mem::size_of::<SuperBlock>() <= BSIZE);
const _USE_AS_BYTES: fn(&SuperBlock) -> &[u8] = AsBytes::as_bytes;
