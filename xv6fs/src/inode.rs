//! Inode table: allocation, freeing, and raw record access.
//!
//! Grounded on `fs.rs::ialloc`/`iget`/`ilock`/`iupdate` in the teacher. The
//! teacher keeps a process-wide `ITABLE` of in-memory inode copies guarded by
//! a spinlock, because multiple kernel threads may reference the same inode
//! concurrently. This library has no concurrent callers (spec §5) and no
//! caching layer (spec §9), so `iget` here is just a range check: the inode
//! "reference" the rest of the crate passes around is its `inum`, and every
//! read/write goes straight to the mapped bytes.

use log::warn;
use zerocopy::{AsBytes, FromBytes};

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::types::{size_of_dinode, DInode, FileType, Le16, Le32};

impl<'a> Image<'a> {
    /// Validates that `inum` is in range `0 < inum < ninodes`.
    pub fn iget(&self, inum: u32) -> Result<u32> {
        self.superblock().check_inum(inum)?;
        Ok(inum)
    }

    /// Inverse of `iget`. Since inodes are addressed by plain `inum` rather
    /// than an in-memory reference (spec §9, "Inode references"), this is
    /// the identity function; it exists so call sites that conceptually
    /// "round-trip" a reference read the same either way.
    pub fn geti(&self, inum: u32) -> u32 {
        inum
    }

    pub fn read_dinode(&self, inum: u32) -> DInode {
        let sb = self.superblock();
        let bn = sb.iblock(inum);
        let off = sb.ioffset(inum);
        let block = self.raw_block(bn);
        DInode::read_from(&block[off..off + size_of_dinode()])
            .expect("inode slice is exactly sizeof(DInode)")
    }

    pub fn write_dinode(&mut self, inum: u32, dip: &DInode) {
        let sb = self.superblock();
        let bn = sb.iblock(inum);
        let off = sb.ioffset(inum);
        let block = self.raw_block_mut(bn);
        block[off..off + size_of_dinode()].copy_from_slice(dip.as_bytes());
    }

    /// Scans inodes from index 1 upward, allocates the first with
    /// `type == 0` by zeroing the record and setting its type. Fails with
    /// `NoFreeInodes` if none is available — fatal, per spec §7.
    pub fn ialloc(&mut self, ty: FileType) -> Result<u32> {
        let ninodes = self.superblock().ninodes();
        for inum in 1..ninodes {
            let dip = self.read_dinode(inum);
            if dip.file_type.get() == FileType::Free as u16 {
                let fresh = DInode {
                    file_type: Le16::new(ty as u16),
                    major: Le16::new(0),
                    minor: Le16::new(0),
                    nlink: Le16::new(0),
                    size: Le32::new(0),
                    addrs: [Le32::new(0); crate::types::NDIRECT + 1],
                };
                self.write_dinode(inum, &fresh);
                return Ok(inum);
            }
        }
        Err(FsError::NoFreeInodes)
    }

    /// Sets `type = 0`. Logs a warning (non-fatal) if the inode was already
    /// free or still had live links at the time of the call.
    pub fn ifree(&mut self, inum: u32) -> Result<()> {
        self.iget(inum)?;
        let mut dip = self.read_dinode(inum);
        if dip.file_type.get() == FileType::Free as u16 {
            warn!("ifree: inode {inum} was already free");
        }
        if dip.nlink.get() > 0 {
            warn!("ifree: inode {inum} freed with nlink={}", dip.nlink.get());
        }
        dip.file_type = Le16::new(FileType::Free as u16);
        self.write_dinode(inum, &dip);
        Ok(())
    }
}
