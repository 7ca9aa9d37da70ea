//! Free-block bitmap. Grounded on `fs.rs::balloc`/`bfree`/`bzero` in the
//! teacher, generalized from a kernel `bread`/`log_write`/`brelse` triple
//! into direct reads/writes against the mapped image.

use log::warn;

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::types::BPB;

fn bit_is_set(block: &[u8], bit: usize) -> bool {
    block[bit / 8] & (1 << (bit % 8)) != 0
}

fn set_bit(block: &mut [u8], bit: usize) {
    block[bit / 8] |= 1 << (bit % 8);
}

fn clear_bit(block: &mut [u8], bit: usize) {
    block[bit / 8] &= !(1 << (bit % 8));
}

impl<'a> Image<'a> {
    /// Returns whether data block `b` is currently marked allocated.
    pub fn bitmap_test(&self, b: u32) -> bool {
        let sb = self.superblock();
        let bn = sb.bblock(b);
        let bit = (b % BPB as u32) as usize;
        bit_is_set(self.raw_block(bn), bit)
    }

    /// Marks block `b` allocated in the bitmap, without zeroing its contents
    /// or checking that it is a data block. Used by `setupfs` to mark the
    /// reserved prefix.
    pub fn bitmap_set(&mut self, b: u32) {
        let sb = self.superblock();
        let bn = sb.bblock(b);
        let bit = (b % BPB as u32) as usize;
        set_bit(self.raw_block_mut(bn), bit);
    }

    /// Scans the bitmap from block 0, returns and allocates the first clear
    /// bit whose block number is a valid data block. The returned block is
    /// zeroed. Fails with `NoFreeBlocks` if none exists — this is the fatal,
    /// resource-exhaustion class of error from spec §7: the caller should
    /// propagate it straight out to the front-end.
    pub fn balloc(&mut self) -> Result<u32> {
        let sb = self.superblock();
        let total = sb.size();
        for b in 0..total {
            let bn = sb.bblock(b);
            let bit = (b % BPB as u32) as usize;
            if !bit_is_set(self.raw_block(bn), bit) {
                if !sb.is_valid_data_block(b) {
                    continue;
                }
                set_bit(self.raw_block_mut(bn), bit);
                self.zero_block(b);
                return Ok(b);
            }
        }
        Err(FsError::NoFreeBlocks)
    }

    /// Frees data block `b`. Clearing an already-clear bit is logged as a
    /// warning and is not an error; passing a block outside the data region
    /// is an `InvalidBlock` error.
    pub fn bfree(&mut self, b: u32) -> Result<()> {
        let sb = self.superblock();
        sb.check_data_block(b)?;
        let bn = sb.bblock(b);
        let bit = (b % BPB as u32) as usize;
        if !bit_is_set(self.raw_block(bn), bit) {
            warn!("bfree: block {b} was already free");
        }
        clear_bit(self.raw_block_mut(bn), bit);
        Ok(())
    }

    /// Popcount of the whole bitmap region (used by `diskinfo`).
    pub fn bitmap_popcount(&self) -> u32 {
        let sb = self.superblock();
        let mut count = 0u32;
        for bn in sb.bmapstart()..sb.bmapstart() + sb.nm_blocks() {
            for byte in self.raw_block(bn) {
                count += byte.count_ones();
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::types::{Le32, SuperBlock, FSMAGIC};

    fn test_image(total_blocks: u32) -> Vec<u8> {
        let nlog = 3;
        let ninodes = 16;
        let logstart = 2u32;
        let ni_blocks = (ninodes as usize).div_ceil(crate::types::IPB) as u32;
        let inodestart = logstart + nlog;
        let nm_blocks = (total_blocks as usize).div_ceil(crate::types::BPB) as u32;
        let bmapstart = inodestart + ni_blocks;
        let nblocks = total_blocks - (bmapstart + nm_blocks);
        let sb = SuperBlock {
            magic: Le32::new(FSMAGIC),
            size: Le32::new(total_blocks),
            nblocks: Le32::new(nblocks),
            ninodes: Le32::new(ninodes),
            nlog: Le32::new(nlog),
            logstart: Le32::new(logstart),
            inodestart: Le32::new(inodestart),
            bmapstart: Le32::new(bmapstart),
        };
        let mut data = vec![0u8; total_blocks as usize * crate::types::BSIZE];
        {
            let mut img = Image::open_unchecked(&mut data);
            img.write_superblock(&sb);
            for b in 0..sb.first_data_block() {
                img.bitmap_set(b);
            }
        }
        data
    }

    #[test]
    fn balloc_skips_reserved_prefix_and_zeroes() {
        let mut data = test_image(200);
        let mut img = Image::open(&mut data).unwrap();
        let sb = img.superblock();
        let b = img.balloc().unwrap();
        assert_eq!(b, sb.first_data_block());
        assert!(img.bitmap_test(b));
        assert!(img.raw_block(b).iter().all(|&x| x == 0));
    }

    #[test]
    fn bfree_then_balloc_reuses_lowest_block() {
        let mut data = test_image(200);
        let mut img = Image::open(&mut data).unwrap();
        let b1 = img.balloc().unwrap();
        let _b2 = img.balloc().unwrap();
        img.bfree(b1).unwrap();
        let b3 = img.balloc().unwrap();
        assert_eq!(b1, b3);
    }

    #[test]
    fn bfree_rejects_non_data_block() {
        let mut data = test_image(200);
        let mut img = Image::open(&mut data).unwrap();
        assert!(img.bfree(0).is_err());
        assert!(img.bfree(1).is_err());
    }

    #[test]
    fn bfree_of_already_free_block_is_not_an_error() {
        let mut data = test_image(200);
        let mut img = Image::open(&mut data).unwrap();
        let b = img.superblock().first_data_block();
        assert!(img.bfree(b).is_ok());
    }
}
