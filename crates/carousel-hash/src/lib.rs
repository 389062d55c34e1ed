//! Pluggable 64-bit hashing for the carousel ring.
//!
//! The ring never hashes anything itself; it calls [`Hasher::sum64`] on
//! whatever implementation the caller configures. Two reference hashers are
//! provided:
//!
//! - [`Fnv1aHasher`] — FNV-1a 64-bit, fast and well dispersed for short keys.
//! - [`Crc64Hasher`] — CRC-64 with the ISO polynomial, matching Go's
//!   `hash/crc64` ISO table.
//!
//! Ring placement is a function of the hash values, so peers that must
//! reproduce each other's placements have to agree on the hasher.

use std::fmt;
use std::hash::Hasher as _;

use crc::{CRC_64_GO_ISO, Crc};
use fnv::FnvHasher;

/// A 64-bit hash function usable by the ring.
///
/// Implementations must be deterministic, side-effect free, and thread-safe:
/// `sum64` is called concurrently from many reader threads.
pub trait Hasher: fmt::Debug + Send + Sync {
    /// Hash `data` to a 64-bit value.
    fn sum64(&self, data: &[u8]) -> u64;
}

/// FNV-1a 64-bit hasher.
///
/// Offset basis `14695981039346656037`, prime `1099511628211`, XOR-then-
/// multiply per input byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1aHasher;

impl Hasher for Fnv1aHasher {
    fn sum64(&self, data: &[u8]) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(data);
        hasher.finish()
    }
}

const CRC64_ISO: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

/// CRC-64 hasher using the reflected ISO polynomial (`0xD800000000000000`),
/// initial value and final XOR of all ones.
///
/// Output is identical to Go's `crc64.Checksum(data, crc64.MakeTable(crc64.ISO))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc64Hasher;

impl Hasher for Crc64Hasher {
    fn sum64(&self, data: &[u8]) -> u64 {
        CRC64_ISO.checksum(data)
    }
}
