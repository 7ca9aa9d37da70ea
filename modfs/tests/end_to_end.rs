//! Drives the real `modfs` binary against a real mapped file, checking that
//! raw field edits bypass the invariants `opfs` enforces — exactly the
//! "repair tool" role spec.md §7 assigns it.

use std::fs::File;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn fresh_image_file(tag: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!("xv6fs-modfs-test-{tag}-{}-{}.img", std::process::id(), n));

    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .expect("create temp image");
    file.set_len(1024 * xv6fs::BSIZE as u64).expect("size temp image");
    let mut mmap = unsafe { memmap2::MmapMut::map_mut(&file) }.expect("map temp image");
    xv6fs::setupfs(&mut mmap[..], 1024, 64, 4).expect("setupfs");
    mmap.flush().expect("flush temp image");
    path
}

fn modfs(img: &PathBuf, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_modfs"))
        .arg(img.to_str().unwrap())
        .args(args)
        .output()
        .expect("modfs should run")
}

#[test]
fn reads_back_a_superblock_field_it_just_set() {
    let img = fresh_image_file("super");

    assert!(modfs(&img, &["superblock", "ninodes", "9999"]).status.success());
    let out = modfs(&img, &["superblock", "ninodes"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "9999");

    std::fs::remove_file(&img).ok();
}

#[test]
fn can_corrupt_a_field_opfs_would_never_allow() {
    let img = fresh_image_file("corrupt");

    // root's nlink is a well-formed 1 after setupfs; stomp it directly.
    assert!(modfs(&img, &["inode", "1", "nlink", "77"]).status.success());
    let out = modfs(&img, &["inode", "1", "nlink"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "77");

    std::fs::remove_file(&img).ok();
}

#[test]
fn dirent_delete_zeroes_the_entry_so_lookup_fails() {
    let img = fresh_image_file("dirent");

    assert!(modfs(&img, &["dirent", "/", ".", "delete"]).status.success());
    let out = modfs(&img, &["dirent", "/", "."]);
    assert!(!out.status.success());

    std::fs::remove_file(&img).ok();
}
