//! End-to-end tests that drive the real `opfs` binary against a real file
//! on disk (not an in-memory buffer), the way an operator would. `xv6fs`'s
//! own unit tests build fixtures in memory; these exercise the actual
//! mmap-and-flush path the binary uses. The image itself is built with
//! `xv6fs::setupfs` directly (exactly what `newfs` does) rather than by
//! shelling out to a second binary, so the test only depends on the crate
//! under test.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn fresh_image_file(tag: &str, size: u32, ninodes: u32, nlog: u32) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!("xv6fs-opfs-test-{tag}-{}-{}.img", std::process::id(), n));

    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .expect("create temp image");
    file.set_len(size as u64 * xv6fs::BSIZE as u64).expect("size temp image");
    let mut mmap = unsafe { memmap2::MmapMut::map_mut(&file) }.expect("map temp image");
    xv6fs::setupfs(&mut mmap[..], size, ninodes, nlog).expect("setupfs");
    mmap.flush().expect("flush temp image");
    path
}

fn opfs(img: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_opfs"))
        .arg(img.to_str().unwrap())
        .args(args)
        .output()
        .expect("opfs should run")
}

#[test]
fn diskinfo_reports_the_arguments_setupfs_was_given() {
    let img = fresh_image_file("diskinfo", 1024, 200, 30);

    let out = opfs(&img, &["diskinfo"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("0x10203040"));
    assert!(stdout.contains("1024 blocks"));
    assert!(stdout.contains("ninodes     200"));

    std::fs::remove_file(&img).ok();
}

#[test]
fn put_then_get_roundtrips_through_a_real_mapped_file() {
    let img = fresh_image_file("putget", 1024, 64, 4);

    let mut put = Command::new(env!("CARGO_BIN_EXE_opfs"))
        .arg(img.to_str().unwrap())
        .args(["put", "/hello"])
        .stdin(std::process::Stdio::piped())
        .spawn()
        .expect("opfs put should spawn");
    use std::io::Write;
    put.stdin.take().unwrap().write_all(b"hello, disk image").unwrap();
    assert!(put.wait().expect("opfs put should finish").success());

    let got = opfs(&img, &["get", "/hello"]);
    assert!(got.status.success(), "{}", String::from_utf8_lossy(&got.stderr));
    assert_eq!(got.stdout, b"hello, disk image");

    std::fs::remove_file(&img).ok();
}

#[test]
fn mkdir_mv_then_ls_reflects_the_rename() {
    let img = fresh_image_file("mkdirmv", 1024, 64, 4);

    assert!(opfs(&img, &["mkdir", "/a"]).status.success());
    assert!(opfs(&img, &["mv", "/a", "/b"]).status.success());

    let ls = opfs(&img, &["ls", "/"]);
    assert!(ls.status.success());
    let stdout = String::from_utf8_lossy(&ls.stdout);
    assert!(stdout.lines().any(|l| l.starts_with("b ")));
    assert!(!stdout.lines().any(|l| l.starts_with("a ")));

    std::fs::remove_file(&img).ok();
}

#[test]
fn rm_of_a_directory_fails_and_leaves_it_in_place() {
    let img = fresh_image_file("rmdir-guard", 1024, 64, 4);
    assert!(opfs(&img, &["mkdir", "/d"]).status.success());

    let rm = opfs(&img, &["rm", "/d"]);
    assert!(!rm.status.success());

    let ls = opfs(&img, &["ls", "/"]);
    assert!(String::from_utf8_lossy(&ls.stdout).lines().any(|l| l.starts_with("d ")));

    std::fs::remove_file(&img).ok();
}

#[test]
fn cp_then_rm_src_preserves_dst_contents() {
    let img = fresh_image_file("cprm", 1024, 64, 4);

    let mut put = Command::new(env!("CARGO_BIN_EXE_opfs"))
        .arg(img.to_str().unwrap())
        .args(["put", "/x"])
        .stdin(std::process::Stdio::piped())
        .spawn()
        .expect("opfs put should spawn");
    use std::io::Write;
    put.stdin.take().unwrap().write_all(b"hello").unwrap();
    assert!(put.wait().expect("opfs put should finish").success());

    assert!(opfs(&img, &["cp", "/x", "/y"]).status.success());
    assert!(opfs(&img, &["rm", "/x"]).status.success());

    let got = opfs(&img, &["get", "/y"]);
    assert!(got.status.success());
    assert_eq!(got.stdout, b"hello");

    std::fs::remove_file(&img).ok();
}
