//! The mapped image itself.
//!
//! Per spec §9 ("Inode references"): there is no in-memory inode cache and
//! no mutable singleton root inode. An `Image` owns the mapped bytes; any
//! inode is addressed by its `inum`, with every access recomputing the byte
//! offset through the superblock. This mirrors the source's raw-pointer
//! approach (`kernel/src/fs/fs.rs`'s `ITABLE`/`IBLOCK!`) without the pointer
//! aliasing or the static table — `Image` is the only thing that borrows the
//! bytes, and inode numbers are plain `u32`s passed alongside it.

use zerocopy::{AsBytes, FromBytes};

use crate::error::{FsError, Result};
use crate::types::{SuperBlock, BSIZE, FSMAGIC};

pub struct Image<'a> {
    data: &'a mut [u8],
}

impl<'a> Image<'a> {
    /// Wraps a mapped image, validating the superblock magic.
    pub fn open(data: &'a mut [u8]) -> Result<Self> {
        let img = Image { data };
        if !img.superblock().is_valid() {
            return Err(FsError::InvalidSuperblock);
        }
        Ok(img)
    }

    /// Wraps a freshly zeroed image with no superblock yet. Used only by
    /// `setupfs`, which writes the superblock itself before any other call.
    pub fn open_unchecked(data: &'a mut [u8]) -> Self {
        Image { data }
    }

    pub fn total_len(&self) -> usize {
        self.data.len()
    }

    pub fn block_count(&self) -> u32 {
        (self.data.len() / BSIZE) as u32
    }

    pub fn superblock(&self) -> SuperBlock {
        let bytes = self.raw_block(1);
        SuperBlock::read_from_prefix(bytes).expect("block is at least sizeof(SuperBlock)")
    }

    pub fn write_superblock(&mut self, sb: &SuperBlock) {
        let bytes = self.raw_block_mut(1);
        bytes[..core::mem::size_of::<SuperBlock>()].copy_from_slice(sb.as_bytes());
    }

    pub fn raw_block(&self, b: u32) -> &[u8] {
        let start = b as usize * BSIZE;
        &self.data[start..start + BSIZE]
    }

    pub fn raw_block_mut(&mut self, b: u32) -> &mut [u8] {
        let start = b as usize * BSIZE;
        &mut self.data[start..start + BSIZE]
    }

    pub fn zero_block(&mut self, b: u32) {
        self.raw_block_mut(b).fill(0);
    }

    pub fn bytes(&self) -> &[u8] {
        self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.data
    }
}

pub const fn blocks_for_bytes(n: usize) -> usize {
    (n + BSIZE - 1) / BSIZE
}

pub const _: () = assert!(FSMAGIC == 0x10203040);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_bad_magic() {
        let mut data = vec![0u8; BSIZE * 4];
        assert!(Image::open(&mut data).is_err());
    }
}
