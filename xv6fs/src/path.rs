//! Path resolution. Grounded on `fs.rs::skipelem`/`namex`/`namei`/
//! `nameiparent` in the teacher, generalized from the kernel's
//! current-working-directory-relative lookup (it starts at `myproc().cwd`
//! for relative paths) to always starting at an explicit root inode, since
//! this library has no process table and no notion of cwd (spec §9,
//! "Global root inode").

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::types::{FileType, Le16, DIRSIZ};

/// Splits off one leading path component. Leading separators are skipped;
/// the component runs up to the next separator or the end of the path and
/// is truncated to `DIRSIZ` bytes, matching every other truncation point in
/// this crate. Returns `None` once nothing but separators (or nothing) is
/// left.
///
/// ```text
/// skipelem("a/bb/c") = Some(("a", "bb/c"))
/// skipelem("///a//bb") = Some(("a", "bb"))
/// skipelem("a") = Some(("a", ""))
/// skipelem("") = skipelem("////") = None
/// ```
pub fn skipelem(path: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut i = 0;
    while i < path.len() && path[i] == b'/' {
        i += 1;
    }
    if i == path.len() {
        return None;
    }
    let start = i;
    while i < path.len() && path[i] != b'/' {
        i += 1;
    }
    let name = &path[start..i];
    let name = if name.len() > DIRSIZ { &name[..DIRSIZ] } else { name };
    while i < path.len() && path[i] == b'/' {
        i += 1;
    }
    Some((name, &path[i..]))
}

/// Splits a path into its directory portion and trailing component, e.g.
/// `splitpath("/a/b/c") == ("/a/b", "c")`. A path with no separator splits
/// into an empty directory portion and the whole path as the basename. A
/// trailing separator yields an empty basename (spec §9: trailing-slash
/// destinations behave as if targeting a directory, since `ilookup` on the
/// empty basename resolves to the directory itself).
pub fn splitpath(path: &[u8]) -> (&[u8], &[u8]) {
    match path.iter().rposition(|&b| b == b'/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (&path[..0], path),
    }
}

impl<'a> Image<'a> {
    /// Resolves `path` against `root`. An empty path (or one made only of
    /// separators) resolves to `root` itself. Every non-terminal component
    /// must name a directory; the terminal component may be any type.
    pub fn ilookup(&mut self, root: u32, path: &[u8]) -> Result<u32> {
        let mut cur = root;
        let mut rest = path;
        loop {
            match skipelem(rest) {
                None => return Ok(cur),
                Some((name, next_rest)) => {
                    if !self.is_dir(cur) {
                        return Err(FsError::NotADirectory(lossy(path)));
                    }
                    let (target, _off) = self.dlookup(cur, name)?;
                    cur = target;
                    rest = next_rest;
                }
            }
        }
    }

    /// Resolves the parent directory of `path`'s terminal component,
    /// returning `(parent_inum, basename)`. Shared by `icreat` and
    /// `iunlink`.
    pub(crate) fn resolve_parent<'p>(&mut self, root: u32, path: &'p [u8]) -> Result<(u32, &'p [u8])> {
        let (dir_part, basename) = splitpath(path);
        let parent = self.ilookup(root, dir_part)?;
        if !self.is_dir(parent) {
            return Err(FsError::NotADirectory(lossy(dir_part)));
        }
        Ok((parent, basename))
    }

    /// Creates a new inode of type `ty` at `path`. The terminal component
    /// must be non-empty and must not already exist in its parent. For
    /// directories, also adds `.` (self) and `..` (parent) entries inside
    /// the new directory.
    pub fn icreat(&mut self, root: u32, path: &[u8], ty: FileType) -> Result<u32> {
        let (parent, basename) = self.resolve_parent(root, path)?;
        if basename.is_empty() {
            return Err(FsError::EmptyComponent);
        }
        if self.dlookup(parent, basename).is_ok() {
            return Err(FsError::AlreadyExists(lossy(path)));
        }

        let inum = self.ialloc(ty)?;
        self.daddent(parent, basename, inum)?;

        if ty == FileType::Dir {
            self.daddent(inum, b".", inum)?;
            self.daddent(inum, b"..", parent)?;
        }
        Ok(inum)
    }

    /// Unlinks the terminal component of `path` from its parent directory,
    /// scrubbing the dirent and adjusting link counts. Frees the target's
    /// data and inode once its `nlink` reaches zero.
    pub fn iunlink(&mut self, root: u32, path: &[u8]) -> Result<()> {
        let (parent, basename) = self.resolve_parent(root, path)?;
        self.unlink_entry(parent, basename)
    }

    /// Same as `iunlink`, but addressed by an already-resolved parent
    /// directory and entry name rather than a path to re-walk. `cp`/`mv`/
    /// `ln` use this once they have already located the destination
    /// directory, to avoid re-resolving a path string for an inode they
    /// already hold.
    pub fn unlink_entry(&mut self, parent: u32, basename: &[u8]) -> Result<()> {
        if basename.is_empty() {
            return Err(FsError::EmptyComponent);
        }
        if basename == b"." || basename == b".." {
            return Err(FsError::UnlinkDotOrDotDot);
        }

        let (target, off) = self.dlookup(parent, basename)?;
        self.derase(parent, off)?;

        if self.is_dir(target) {
            let mut pdip = self.read_dinode(parent);
            pdip.nlink = Le16::new(pdip.nlink.get().saturating_sub(1));
            self.write_dinode(parent, &pdip);
        }

        let mut tdip = self.read_dinode(target);
        tdip.nlink = Le16::new(tdip.nlink.get().saturating_sub(1));
        self.write_dinode(target, &tdip);

        if tdip.nlink.get() == 0 {
            if tdip.ty() != Some(FileType::Device) {
                self.itruncate(target, 0)?;
            }
            self.ifree(target)?;
        }
        Ok(())
    }
}

pub(crate) fn lossy(path: &[u8]) -> String {
    String::from_utf8_lossy(path).into_owned()
}
