//! Test-only helper for building a valid in-memory image. Not part of the
//! public API; every test module in this crate builds its fixtures through
//! `fresh_image` rather than hand-rolling a superblock.
#![cfg(test)]

use crate::builder::setupfs;

pub fn fresh_image(total_blocks: u32, ninodes: u32, nlog: u32) -> Vec<u8> {
    let mut data = vec![0u8; total_blocks as usize * crate::types::BSIZE];
    setupfs(&mut data, total_blocks, ninodes, nlog).expect("fresh_image: setupfs failed");
    data
}
