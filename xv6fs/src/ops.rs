//! High-level operations: `ls`, `get`, `put`, `cp`, `mv`, `ln`, `rm`,
//! `mkdir`, `rmdir`, `info`, `diskinfo` (spec §4.8). The teacher has no
//! direct counterpart — `mkfs/src/main.rs` only ever appends files into a
//! brand-new image — so this module is built straight from the primitives
//! below it (`path`, `dir`, `io`), each call a small composition of
//! `ilookup`/`icreat`/`iunlink`/`daddent`/`iread`/`iwrite` in the same style
//! those primitives are themselves written in.

use std::io::{Read, Write};

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::path::{lossy, splitpath};
use crate::types::{FileType, BSIZE, DIRSIZ, MAXFILE, NDIRECT, ROOTINO};

/// Chunk size for streaming `get`/`put`, matching the teacher's
/// block-multiple buffer sizing in `mkfs/src/main.rs`'s read loop.
pub const BUFSIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub inum: u32,
    pub name: String,
    pub ty: FileType,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct InodeInfo {
    pub inum: u32,
    pub ty: FileType,
    pub nlink: u16,
    pub size: u32,
    /// Direct blocks, then (if present) the indirect pointer block followed
    /// by its contents, stopping at the first zero slot.
    pub blocks: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct DiskInfo {
    pub magic: u32,
    pub size: u32,
    pub ninodes: u32,
    pub nlog: u32,
    pub log_range: (u32, u32),
    pub inode_range: (u32, u32),
    pub bmap_range: (u32, u32),
    pub data_range: (u32, u32),
    pub maxfilesize: usize,
    pub used_blocks: u32,
    /// Indexed by `FileType as usize`. Index 0 (`Free`) accumulates the
    /// count of unallocated inodes rather than a live type; `opfs` only
    /// ever reads the `Dir`/`File`/`Device` slots.
    pub used_inodes_by_type: [u32; 4],
}

fn name_str(raw: &[u8; DIRSIZ]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

impl<'a> Image<'a> {
    fn entry_info(&mut self, inum: u32, name: String) -> EntryInfo {
        let dip = self.read_dinode(inum);
        EntryInfo {
            inum,
            name,
            ty: dip.ty().unwrap_or(FileType::Free),
            size: dip.size.get(),
        }
    }

    /// One line per nonzero entry if `path` is a directory; one line for
    /// the file itself otherwise.
    pub fn ls(&mut self, path: &[u8]) -> Result<Vec<EntryInfo>> {
        let target = self.ilookup(ROOTINO, path)?;
        if self.is_dir(target) {
            let entries = self.list_dirents(target)?;
            Ok(entries
                .into_iter()
                .map(|(inum, name)| self.entry_info(inum, name_str(&name)))
                .collect())
        } else {
            let (_, base) = splitpath(path);
            Ok(vec![self.entry_info(target, lossy(base))])
        }
    }

    /// Streams `path`'s contents to `out` in `BUFSIZE` chunks.
    pub fn get(&mut self, path: &[u8], mut out: impl Write) -> Result<()> {
        let inum = self.ilookup(ROOTINO, path)?;
        let mut buf = [0u8; BUFSIZE];
        let mut off = 0u64;
        loop {
            let n = self.iread(inum, &mut buf, off)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            off += n as u64;
        }
        Ok(())
    }

    /// Streams `input` into `path`, truncating an existing regular file or
    /// creating one in an already-existing parent directory. Stops at
    /// short read (EOF).
    pub fn put(&mut self, path: &[u8], mut input: impl Read) -> Result<()> {
        let inum = match self.ilookup(ROOTINO, path) {
            Ok(existing) => {
                if self.read_dinode(existing).ty() != Some(FileType::File) {
                    return Err(FsError::TypeMismatch(lossy(path)));
                }
                self.itruncate(existing, 0)?;
                existing
            }
            Err(_) => self.icreat(ROOTINO, path, FileType::File)?,
        };

        let mut buf = [0u8; BUFSIZE];
        let mut off = 0u64;
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            self.iwrite(inum, &buf[..n], off)?;
            off += n as u64;
        }
        Ok(())
    }

    /// Refuses directories; otherwise `iunlink`s `path`.
    pub fn rm(&mut self, path: &[u8]) -> Result<()> {
        let inum = self.ilookup(ROOTINO, path)?;
        if self.is_dir(inum) {
            return Err(FsError::IsADirectory(lossy(path)));
        }
        self.iunlink(ROOTINO, path)
    }

    pub fn mkdir(&mut self, path: &[u8]) -> Result<u32> {
        self.icreat(ROOTINO, path, FileType::Dir)
    }

    /// `path` must resolve to an empty directory.
    pub fn rmdir(&mut self, path: &[u8]) -> Result<()> {
        let inum = self.ilookup(ROOTINO, path)?;
        if !self.is_dir(inum) {
            return Err(FsError::NotADirectory(lossy(path)));
        }
        if !self.demptydir(inum)? {
            return Err(FsError::NotEmpty(lossy(path)));
        }
        self.iunlink(ROOTINO, path)
    }

    /// Resolves `dst` per the rules shared by `cp`'s destination handling
    /// (spec §4.8): an existing directory gets a new entry named after
    /// `basename_src`; an existing regular file is truncated; a device is
    /// rejected; a nonexistent path is created in its (must-exist) parent.
    fn resolve_copy_target(&mut self, dst: &[u8], basename_src: &[u8]) -> Result<u32> {
        if let Ok(existing) = self.ilookup(ROOTINO, dst) {
            return match self.read_dinode(existing).ty() {
                Some(FileType::Dir) => self.icreat(existing, basename_src, FileType::File),
                Some(FileType::File) => {
                    self.itruncate(existing, 0)?;
                    Ok(existing)
                }
                _ => Err(FsError::TypeMismatch(lossy(dst))),
            };
        }

        let (dir_part, base) = splitpath(dst);
        if base.is_empty() {
            return Err(FsError::EmptyComponent);
        }
        let parent = self.ilookup(ROOTINO, dir_part)?;
        if !self.is_dir(parent) {
            return Err(FsError::NotADirectory(lossy(dir_part)));
        }
        self.icreat(parent, base, FileType::File)
    }

    fn stream_copy(&mut self, src: u32, dst: u32) -> Result<()> {
        let mut buf = [0u8; BUFSIZE];
        let mut off = 0u64;
        loop {
            let n = self.iread(src, &mut buf, off)?;
            if n == 0 {
                break;
            }
            self.iwrite(dst, &buf[..n], off)?;
            off += n as u64;
        }
        Ok(())
    }

    /// `src` must be a regular file. See `resolve_copy_target` for `dst`'s
    /// resolution rules.
    pub fn cp(&mut self, src: &[u8], dst: &[u8]) -> Result<()> {
        let src_inum = self.ilookup(ROOTINO, src)?;
        if self.read_dinode(src_inum).ty() != Some(FileType::File) {
            return Err(FsError::TypeMismatch(lossy(src)));
        }
        let (_, src_base) = splitpath(src);
        let dst_inum = self.resolve_copy_target(dst, src_base)?;
        self.stream_copy(src_inum, dst_inum)
    }

    /// `src` must be a regular file; directories cannot be hard-linked. See
    /// spec §4.8 for `dst`'s resolution rules.
    pub fn ln(&mut self, src: &[u8], dst: &[u8]) -> Result<()> {
        let src_inum = self.ilookup(ROOTINO, src)?;
        if self.read_dinode(src_inum).ty() != Some(FileType::File) {
            return Err(FsError::TypeMismatch(lossy(src)));
        }

        if let Ok(existing) = self.ilookup(ROOTINO, dst) {
            if self.is_dir(existing) {
                let (_, src_base) = splitpath(src);
                return self.daddent(existing, src_base, src_inum);
            }
        }

        let (dir_part, base) = splitpath(dst);
        let dir_inum = self.ilookup(ROOTINO, dir_part)?;
        if !self.is_dir(dir_inum) {
            return Err(FsError::NotADirectory(lossy(dir_part)));
        }
        let name: &[u8] = if base.is_empty() { splitpath(src).1 } else { base };
        self.daddent(dir_inum, name, src_inum)
    }

    /// `src` must not be the root inode. Moves (rather than copies) the
    /// source entry to `dst`, reusing `cp`'s destination-resolution shape;
    /// see spec §4.8 for the exact collision rules.
    pub fn mv(&mut self, src: &[u8], dst: &[u8]) -> Result<()> {
        let src_inum = self.ilookup(ROOTINO, src)?;
        if src_inum == ROOTINO {
            return Err(FsError::IsRoot);
        }
        let src_ty = self.read_dinode(src_inum).ty();
        let (src_parent, src_base) = self.resolve_parent(ROOTINO, src)?;
        let src_base = src_base.to_vec();

        let (dest_dir, dest_name): (u32, Vec<u8>) =
            if let Ok(existing) = self.ilookup(ROOTINO, dst) {
                if self.is_dir(existing) && existing != src_inum {
                    if !self.demptydir(existing)? {
                        return Err(FsError::NotEmpty(lossy(dst)));
                    }
                    (existing, src_base.clone())
                } else {
                    let (dir_part, base) = splitpath(dst);
                    let parent = self.ilookup(ROOTINO, dir_part)?;
                    (parent, base.to_vec())
                }
            } else {
                let (dir_part, base) = splitpath(dst);
                let parent = self.ilookup(ROOTINO, dir_part)?;
                if !self.is_dir(parent) {
                    return Err(FsError::NotADirectory(lossy(dir_part)));
                }
                let name = if base.is_empty() { src_base.clone() } else { base.to_vec() };
                (parent, name)
            };

        if let Ok((existing_inum, _)) = self.dlookup(dest_dir, &dest_name) {
            if existing_inum != src_inum {
                let existing_ty = self.read_dinode(existing_inum).ty();
                if existing_ty == Some(FileType::Device) {
                    return Err(FsError::TypeMismatch(lossy(dst)));
                }
                if existing_ty != src_ty {
                    return Err(FsError::TypeMismatch(lossy(dst)));
                }
                if existing_ty == Some(FileType::Dir) && !self.demptydir(existing_inum)? {
                    return Err(FsError::NotEmpty(lossy(dst)));
                }
                self.unlink_entry(dest_dir, &dest_name)?;
            }
        }

        self.daddent(dest_dir, &dest_name, src_inum)?;
        self.unlink_entry(src_parent, &src_base)?;

        if src_ty == Some(FileType::Dir) {
            self.dmkparlink(dest_dir, src_inum)?;
        }

        Ok(())
    }

    /// Inode number, type, nlink, size, and (if `size > 0`) the file's data
    /// block list: direct blocks, then the indirect pointer block and its
    /// contents, stopping at the first zero slot.
    pub fn info(&mut self, path: &[u8]) -> Result<InodeInfo> {
        let inum = self.ilookup(ROOTINO, path)?;
        let dip = self.read_dinode(inum);
        let mut blocks = Vec::new();
        if dip.size.get() > 0 {
            for slot in dip.addrs.iter().take(NDIRECT) {
                let b = slot.get();
                if b == 0 {
                    break;
                }
                blocks.push(b);
            }
            let indirect = dip.addrs[NDIRECT].get();
            if indirect != 0 {
                blocks.push(indirect);
                for &b in self.read_indirect(indirect).iter() {
                    if b == 0 {
                        break;
                    }
                    blocks.push(b);
                }
            }
        }
        Ok(InodeInfo {
            inum,
            ty: dip.ty().unwrap_or(FileType::Free),
            nlink: dip.nlink.get(),
            size: dip.size.get(),
            blocks,
        })
    }

    /// Magic, totals, region ranges, derived max file size, used-block
    /// count, and used-inode counts split by type.
    pub fn diskinfo(&mut self) -> Result<DiskInfo> {
        let sb = self.superblock();
        let mut used_by_type = [0u32; 4];
        for inum in 1..sb.ninodes() {
            let dip = self.read_dinode(inum);
            let idx = (dip.file_type.get() as usize).min(3);
            used_by_type[idx] += 1;
        }
        Ok(DiskInfo {
            magic: sb.magic(),
            size: sb.size(),
            ninodes: sb.ninodes(),
            nlog: sb.nlog(),
            log_range: (sb.logstart(), sb.logstart() + sb.nlog() - 1),
            inode_range: (sb.inodestart(), sb.inodestart() + sb.ni_blocks() - 1),
            bmap_range: (sb.bmapstart(), sb.bmapstart() + sb.nm_blocks() - 1),
            data_range: (sb.first_data_block(), sb.last_data_block()),
            maxfilesize: MAXFILE * BSIZE,
            used_blocks: self.bitmap_popcount(),
            used_inodes_by_type: used_by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::fresh_image;
    use crate::types::FileType;

    fn img(data: &mut [u8]) -> crate::image::Image<'_> {
        crate::image::Image::open(data).unwrap()
    }

    #[test]
    fn put_then_get_roundtrips() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.put(b"/x", &b"hello"[..]).unwrap();
        let mut out = Vec::new();
        fs.get(b"/x", &mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn cp_then_rm_src_preserves_dst() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.put(b"/x", &b"hello"[..]).unwrap();
        fs.cp(b"/x", b"/y").unwrap();
        fs.rm(b"/x").unwrap();
        let mut out = Vec::new();
        fs.get(b"/y", &mut out).unwrap();
        assert_eq!(out, b"hello");
        let info = fs.info(b"/y").unwrap();
        assert_eq!(info.nlink, 1);
    }

    #[test]
    fn ln_then_rm_src_preserves_contents_and_nlink() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.put(b"/a", &b"hi"[..]).unwrap();
        fs.ln(b"/a", b"/b").unwrap();
        fs.rm(b"/a").unwrap();
        let mut out = Vec::new();
        fs.get(b"/b", &mut out).unwrap();
        assert_eq!(out, b"hi");
        let info = fs.info(b"/b").unwrap();
        assert_eq!(info.nlink, 1);
    }

    #[test]
    fn mkdir_mv_updates_dotdot_and_ls() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.mkdir(b"/d").unwrap();
        fs.mkdir(b"/d/e").unwrap();
        fs.mv(b"/d", b"/f").unwrap();

        let root_entries = fs.ls(b"/").unwrap();
        assert!(root_entries.iter().any(|e| e.name == "f"));
        assert!(!root_entries.iter().any(|e| e.name == "d"));

        let f_entries = fs.ls(b"/f").unwrap();
        let names: Vec<_> = f_entries.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"."));
        assert!(names.contains(&".."));
        assert!(names.contains(&"e"));

        let f = fs.ilookup(crate::types::ROOTINO, b"/f").unwrap();
        let dotdot = fs.dlookup(f, b"..").unwrap();
        assert_eq!(dotdot.0, crate::types::ROOTINO);
    }

    #[test]
    fn mv_onto_nonempty_dir_errors_without_state_change() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.mkdir(b"/a").unwrap();
        fs.mkdir(b"/a/inner").unwrap();
        fs.mkdir(b"/b").unwrap();
        fs.mkdir(b"/b/inner2").unwrap();
        let err = fs.mv(b"/a", b"/b").unwrap_err();
        assert!(matches!(err, crate::error::FsError::NotEmpty(_)));
        assert!(fs.ls(b"/a").unwrap().iter().any(|e| e.name == "inner"));
        assert!(fs.ls(b"/b").unwrap().iter().any(|e| e.name == "inner2"));
    }

    #[test]
    fn rmdir_on_nonempty_directory_errors() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.mkdir(b"/d").unwrap();
        fs.put(b"/d/f", &b""[..]).unwrap();
        assert!(fs.rmdir(b"/d").is_err());
    }

    #[test]
    fn rm_refuses_directories() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.mkdir(b"/d").unwrap();
        assert!(fs.rm(b"/d").is_err());
    }

    #[test]
    fn diskinfo_reports_round_tripped_arguments() {
        let mut data = fresh_image(1024, 200, 30);
        let mut fs = img(&mut data);
        let info = fs.diskinfo().unwrap();
        assert_eq!(info.size, 1024);
        assert_eq!(info.ninodes, 200);
        assert_eq!(info.nlog, 30);
        assert_eq!(info.magic, crate::types::FSMAGIC);
        assert_eq!(info.maxfilesize, crate::types::MAXFILE * crate::types::BSIZE);
    }

    #[test]
    fn diskinfo_counts_inodes_by_type() {
        let mut data = fresh_image(1024, 64, 4);
        let mut fs = img(&mut data);
        fs.mkdir(b"/d").unwrap();
        fs.put(b"/f", &b"x"[..]).unwrap();
        let info = fs.diskinfo().unwrap();
        assert_eq!(info.used_inodes_by_type[FileType::Dir as usize], 2); // root + /d
        assert_eq!(info.used_inodes_by_type[FileType::File as usize], 1);
    }
}
