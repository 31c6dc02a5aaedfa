//! DJB2 string hashing for the field table.

use std::hash::{BuildHasherDefault, Hasher};

const SEED: u64 = 5381;

/// Daniel J. Bernstein's multiplicative hash, `h = h * 33 + byte`.
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher {
    hash: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { hash: SEED }
    }
}

impl Hasher for Djb2Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = self.hash.wrapping_mul(33).wrapping_add(u64::from(byte));
        }
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

pub type Djb2BuildHasher = BuildHasherDefault<Djb2Hasher>;
