//! Raw field editor backing `modfs`: direct get/set of on-disk fields,
//! bypassing every invariant the rest of the crate enforces. Grounded on the
//! same `IBLOCK!`/`BBLOCK!` arithmetic as `layout.rs` and `inode.rs`, but
//! exposed without the `ialloc`/`bmap` bookkeeping around it — this module
//! exists so a caller can deliberately construct an inconsistent image to
//! exercise `opfs`'s error handling, or hand-patch one field of an otherwise
//! valid image.

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::types::{Dirent, Le16, Le32};

/// Superblock fields addressable by `modfs set-super`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperField {
    Magic,
    Size,
    NBlocks,
    NInodes,
    NLog,
    LogStart,
    InodeStart,
    BmapStart,
}

/// Per-inode fields addressable by `modfs set-inode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeField {
    Type,
    Major,
    Minor,
    NLink,
    Size,
    Addr(usize),
}

impl<'a> Image<'a> {
    pub fn raw_get_super(&self, field: SuperField) -> u32 {
        let sb = self.superblock();
        match field {
            SuperField::Magic => sb.magic(),
            SuperField::Size => sb.size(),
            SuperField::NBlocks => sb.nblocks(),
            SuperField::NInodes => sb.ninodes(),
            SuperField::NLog => sb.nlog(),
            SuperField::LogStart => sb.logstart(),
            SuperField::InodeStart => sb.inodestart(),
            SuperField::BmapStart => sb.bmapstart(),
        }
    }

    /// Overwrites a single superblock field, unconditionally. No
    /// consistency check is performed — it is entirely possible to make the
    /// image unreadable with this call; that is the point.
    pub fn raw_set_super(&mut self, field: SuperField, value: u32) {
        let mut sb = self.superblock();
        match field {
            SuperField::Magic => sb.magic = Le32::new(value),
            SuperField::Size => sb.size = Le32::new(value),
            SuperField::NBlocks => sb.nblocks = Le32::new(value),
            SuperField::NInodes => sb.ninodes = Le32::new(value),
            SuperField::NLog => sb.nlog = Le32::new(value),
            SuperField::LogStart => sb.logstart = Le32::new(value),
            SuperField::InodeStart => sb.inodestart = Le32::new(value),
            SuperField::BmapStart => sb.bmapstart = Le32::new(value),
        }
        self.write_superblock(&sb);
    }

    /// Reads the bitmap bit for data block `b` directly, without checking
    /// that `b` falls within the data region.
    pub fn raw_get_bit(&self, b: u32) -> bool {
        self.bitmap_test(b)
    }

    /// Sets or clears the bitmap bit for block `b`, without zeroing the
    /// block's contents or validating the region. `set = false` clears it
    /// the same way `bfree` would, minus the double-free warning.
    pub fn raw_set_bit(&mut self, b: u32, set: bool) {
        if set {
            self.bitmap_set(b);
        } else {
            let sb = self.superblock();
            let bn = sb.bblock(b);
            let bit = (b % crate::types::BPB as u32) as usize;
            self.raw_block_mut(bn)[bit / 8] &= !(1 << (bit % 8));
        }
    }

    pub fn raw_get_inode(&self, inum: u32, field: InodeField) -> Result<u32> {
        self.superblock().check_inum(inum)?;
        let dip = self.read_dinode(inum);
        Ok(match field {
            InodeField::Type => dip.file_type.get() as u32,
            InodeField::Major => dip.major.get() as u32,
            InodeField::Minor => dip.minor.get() as u32,
            InodeField::NLink => dip.nlink.get() as u32,
            InodeField::Size => dip.size.get(),
            InodeField::Addr(i) => dip
                .addrs
                .get(i)
                .map(|v| v.get())
                .ok_or_else(|| FsError::UnknownField(format!("addrs[{i}]")))?,
        })
    }

    /// Overwrites one field of inode `inum`'s on-disk record. Does not touch
    /// the bitmap, does not free or allocate blocks, does not adjust any
    /// other inode's `nlink` — entirely the caller's responsibility.
    pub fn raw_set_inode(&mut self, inum: u32, field: InodeField, value: u32) -> Result<()> {
        self.superblock().check_inum(inum)?;
        let mut dip = self.read_dinode(inum);
        match field {
            InodeField::Type => dip.file_type = Le16::new(value as u16),
            InodeField::Major => dip.major = Le16::new(value as u16),
            InodeField::Minor => dip.minor = Le16::new(value as u16),
            InodeField::NLink => dip.nlink = Le16::new(value as u16),
            InodeField::Size => dip.size = Le32::new(value),
            InodeField::Addr(i) => {
                if i >= dip.addrs.len() {
                    return Err(FsError::UnknownField(format!("addrs[{i}]")));
                }
                dip.addrs[i] = Le32::new(value);
            }
        }
        self.write_dinode(inum, &dip);
        Ok(())
    }

    /// Sets the `inum` field of the dirent named `name` inside directory
    /// `dir` to `target` (pass `0` to mark the slot free). Unlike
    /// `daddent`/`unlink_entry`, this never touches any inode's `nlink`.
    pub fn raw_set_dirent(&mut self, dir: u32, name: &[u8], target: u32) -> Result<()> {
        let (_, off) = self.dlookup(dir, name)?;
        let de = Dirent::new(target, name);
        self.raw_write_dirent_at(dir, off, &de)
    }

    fn raw_write_dirent_at(&mut self, dir: u32, off: u64, de: &Dirent) -> Result<()> {
        use zerocopy::AsBytes;
        self.iwrite(dir, de.as_bytes(), off)?;
        Ok(())
    }
}
