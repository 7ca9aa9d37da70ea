//! `opfs` — safe, consistency-preserving operations against an existing
//! xv6-riscv file system image.
//!
//! Generalizes the teacher's single-`Parser` `mkfs::Args` into a
//! `clap::Subcommand` enum, one variant per verb spec.md §4.8/§6 names.
//! Opens the image via `memmap2::MmapMut` and dispatches straight into
//! `xv6fs::ops` through an `xv6fs::Image` handle.

use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xv6fs::{FileType, Image};

#[derive(Parser, Debug)]
#[command(name = "opfs")]
struct Args {
    /// Path to an existing xv6-riscv image file.
    imgfile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print region layout, totals, and usage counts.
    Diskinfo,
    /// Print inode number, type, nlink, size, and block list for a path.
    Info { path: String },
    /// List a directory's entries, or describe a single file.
    Ls { path: String },
    /// Stream a file's contents to standard output.
    Get { path: String },
    /// Stream standard input into a (possibly new) regular file.
    Put { path: String },
    /// Remove a non-directory entry.
    Rm { path: String },
    /// Copy a regular file to a new path.
    Cp { src: String, dst: String },
    /// Move or rename a path.
    Mv { src: String, dst: String },
    /// Hard-link a regular file at a new path.
    Ln { src: String, dst: String },
    /// Create a new, empty directory.
    Mkdir { path: String },
    /// Remove an empty directory.
    Rmdir { path: String },
}

fn type_name(ty: FileType) -> &'static str {
    ty.name()
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
        Command::Diskinfo => {
            let info = image.diskinfo()?;
            println!("magic       0x{:08x}", info.magic);
            println!("size        {} blocks", info.size);
            println!("ninodes     {}", info.ninodes);
            println!("nlog        {} blocks [{}..{}]", info.nlog, info.log_range.0, info.log_range.1);
            println!("inodes      [{}..{}]", info.inode_range.0, info.inode_range.1);
            println!("bitmap      [{}..{}]", info.bmap_range.0, info.bmap_range.1);
            println!("data        [{}..{}]", info.data_range.0, info.data_range.1);
            println!("maxfilesize {} bytes", info.maxfilesize);
            println!("used blocks {}", info.used_blocks);
            println!(
                "used inodes dir={} file={} device={}",
                info.used_inodes_by_type[FileType::Dir as usize],
                info.used_inodes_by_type[FileType::File as usize],
                info.used_inodes_by_type[FileType::Device as usize]
            );
        }
        Command::Info { path } => {
            let info = image.info(path.as_bytes())?;
            println!(
                "inum={} type={}({}) nlink={} size={}",
                info.inum,
                type_name(info.ty),
                info.ty as u16,
                info.nlink,
                info.size
            );
            if info.size > 0 {
                println!("blocks ({}): {:?}", info.blocks.len(), info.blocks);
            }
        }
        Command::Ls { path } => {
            for e in image.ls(path.as_bytes())? {
                println!("{} {} {} {}", e.name, type_name(e.ty), e.inum, e.size);
            }
        }
        Command::Get { path } => {
            let stdout = io::stdout();
            image.get(path.as_bytes(), stdout.lock())?;
        }
        Command::Put { path } => {
            let stdin = io::stdin();
            image.put(path.as_bytes(), stdin.lock())?;
        }
        Command::Rm { path } => image.rm(path.as_bytes())?,
        Command::Cp { src, dst } => image.cp(src.as_bytes(), dst.as_bytes())?,
        Command::Mv { src, dst } => image.mv(src.as_bytes(), dst.as_bytes())?,
        Command::Ln { src, dst } => image.ln(src.as_bytes(), dst.as_bytes())?,
        Command::Mkdir { path } => {
            image.mkdir(path.as_bytes())?;
        }
        Command::Rmdir { path } => image.rmdir(path.as_bytes())?,
    }

    mmap.flush().context("flushing image to disk")?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("opfs: {e:#}");
        std::process::exit(1);
    }
}
