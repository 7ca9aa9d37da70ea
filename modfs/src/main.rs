//! `modfs` — raw, unchecked field editor for xv6-riscv file system images.
//!
//! Exposes direct get/set of the named fields spec.md §4.10 lists: every
//! superblock field, a bitmap bit by block number, per-inode fields, and a
//! dirent's `inum` by `(path, name)` with a special `delete` token. These
//! bypass every invariant `xv6fs::ops` enforces on purpose — this binary is
//! the test harness's (and the operator's) path to constructing, or
//! repairing, a corrupted image (spec.md §7: "the operator (`modfs`) is the
//! repair tool").
//!
//! With no value argument, the current field value is printed; with a value,
//! the field is set.

use std::fs::File;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use xv6fs::{Image, InodeField, SuperField};

#[derive(Parser, Debug)]
#[command(name = "modfs")]
struct Args {
    /// Path to an existing xv6-riscv image file.
    imgfile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read or set one superblock field.
    Superblock {
        /// One of: magic, size, nblocks, ninodes, nlog, logstart, inodestart, bmapstart.
        field: String,
        /// New value; omit to print the current value.
        value: Option<u32>,
    },
    /// Read or set the bitmap bit for a block number.
    Bitmap {
        block: u32,
        /// 0 or 1; omit to print the current bit.
        value: Option<u32>,
    },
    /// Read or set one field of an inode record.
    Inode {
        inum: u32,
        /// One of: type, major, minor, nlink, size, indirect, addr0..addr11.
        field: String,
        /// New value; omit to print the current value.
        value: Option<u32>,
    },
    /// Read or set the inum of a dirent named `name` inside directory `path`.
    Dirent {
        /// Path to the containing directory.
        path: String,
        name: String,
        /// New inum, the literal `delete` to zero the entry, or omit to print.
        value: Option<String>,
    },
}

fn parse_super_field(s: &str) -> Result<SuperField> {
    Ok(match s {
        "magic" => SuperField::Magic,
        "size" => SuperField::Size,
        "nblocks" => SuperField::NBlocks,
        "ninodes" => SuperField::NInodes,
        "nlog" => SuperField::NLog,
        "logstart" => SuperField::LogStart,
        "inodestart" => SuperField::InodeStart,
        "bmapstart" => SuperField::BmapStart,
        other => bail!("unknown superblock field {other:?}"),
    })
}

fn parse_inode_field(s: &str) -> Result<InodeField> {
    if let Some(n) = s.strip_prefix("addr") {
        let i: usize = n.parse().with_context(|| format!("bad addr index in {s:?}"))?;
        return Ok(InodeField::Addr(i));
    }
    Ok(match s {
        "type" => InodeField::Type,
        "major" => InodeField::Major,
        "minor" => InodeField::Minor,
        "nlink" => InodeField::NLink,
        "size" => InodeField::Size,
        "indirect" => InodeField::Addr(xv6fs::NDIRECT),
        other => bail!("unknown inode field {other:?}"),
    })
}

fn run(args: Args) -> Result<()> {
    let file = File::options()
        .read(true)
        .write(true)
        .open(&args.imgfile)
        .with_context(|| format!("opening {}", args.imgfile))?;
    let mut mmap = unsafe { memmap2::MmapMut::map_mut(&file) }
        .with_context(|| format!("mapping {}", args.imgfile))?;
    let mut image = Image::open(&mut mmap[..]).context("reading superblock")?;

    match args.command {
        Command::Superblock { field, value } => {
            let field = parse_super_field(&field)?;
            match value {
                None => println!("{}", image.raw_get_super(field)),
                Some(v) => image.raw_set_super(field, v),
            }
        }
        Command::Bitmap { block, value } => match value {
            None => println!("{}", image.raw_get_bit(block) as u32),
            Some(v) => image.raw_set_bit(block, v != 0),
        },
        Command::Inode { inum, field, value } => {
            let field = parse_inode_field(&field)?;
            match value {
                None => println!("{}", image.raw_get_inode(inum, field)?),
                Some(v) => image.raw_set_inode(inum, field, v)?,
            }
        }
        Command::Dirent { path, name, value } => {
            let dir = image.ilookup(xv6fs::ROOTINO, path.as_bytes())?;
            match value {
                None => {
                    let (inum, _off) = image.dlookup(dir, name.as_bytes())?;
                    println!("{inum}");
                }
                Some(v) if v.as_str() == "delete" => {
                    let (_inum, off) = image.dlookup(dir, name.as_bytes())?;
                    image.derase(dir, off)?;
                }
                Some(v) => {
                    let target: u32 = v.parse().with_context(|| format!("bad inum {v:?}"))?;
                    image.raw_set_dirent(dir, name.as_bytes(), target)?;
                }
            }
        }
    }

    mmap.flush().context("flushing image to disk")?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("modfs: {e:#}");
        std::process::exit(1);
    }
}
