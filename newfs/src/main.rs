//! `newfs` — creates a fresh, empty xv6-riscv file system image.
//!
//! Thin `clap::Parser` front-end over [`xv6fs::setupfs`], generalized from
//! the teacher's `mkfs::Args` (fixed `NINODES`/`FSSIZE`/`NLOG` constants and
//! an embedded-files list) to the four CLI arguments spec.md §6 names:
//! image path, total size in blocks, inode count, and log block count.

use std::fs::File;

use anyhow::{bail, Context, Result};
use clap::Parser;

/// Creates a new xv6-riscv file system image of `size` blocks.
#[derive(Parser, Debug)]
#[command(name = "newfs")]
struct Args {
    /// Path of the image file to create (overwritten if it already exists).
    imgfile: String,

    /// Total image size, in 512-byte blocks.
    size: u32,

    /// Number of inodes to provision.
    ninodes: u32,

    /// Number of log blocks to reserve (never interpreted; space only).
    nlog: u32,
}

fn run(args: Args) -> Result<()> {
    if args.size == 0 {
        bail!("size must be nonzero");
    }

    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&args.imgfile)
        .with_context(|| format!("creating {}", args.imgfile))?;

    let total_bytes = args.size as u64 * xv6fs::BSIZE as u64;
    file.set_len(total_bytes)
        .with_context(|| format!("sizing {} to {} bytes", args.imgfile, total_bytes))?;

    let mut mmap = unsafe { memmap2::MmapMut::map_mut(&file) }
        .with_context(|| format!("mapping {}", args.imgfile))?;

    xv6fs::setupfs(&mut mmap[..], args.size, args.ninodes, args.nlog)
        .context("initializing file system")?;

    mmap.flush().context("flushing image to disk")?;

    log::info!(
        "created {} ({} blocks, {} inodes, {} log blocks)",
        args.imgfile,
        args.size,
        args.ninodes,
        args.nlog
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("newfs: {e:#}");
        std::process::exit(1);
    }
}
