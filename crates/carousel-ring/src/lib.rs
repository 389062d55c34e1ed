//! Bounded-load consistent hash ring.
//!
//! This crate maps an unbounded universe of keys onto a small, dynamic set of
//! members (servers, shards, gateways) such that:
//!
//! - the owner of each key is deterministic given the member set,
//! - adding or removing a member reshuffles only a small fraction of keys,
//! - no member owns more than `ceil(P/M * L)` of the `P` partitions, no
//!   matter how skewed the key distribution is.
//!
//! Keys never name members directly. A key hashes to one of `P` partitions
//! (`hash mod P`), and a placement pass assigns every partition to a member
//! by walking a ring of virtual nodes, skipping members that are already at
//! the load cap.
//!
//! The building blocks:
//!
//! - [`Member`] — the capability a placed entity provides: a stable string
//!   identity plus `Clone`.
//! - [`RingConfig`] — hasher, partition count, replication factor, and load
//!   factor; zero values adopt the defaults `271 / 20 / 1.25`.
//! - [`Ring`] — the ring itself: concurrent readers, serialized writers,
//!   shared (`Arc`) member handles.
//! - [`RingError`] — configuration and query failures.
//!
//! Hashing is pluggable through [`carousel_hash::Hasher`]; placement is a
//! wire-visible contract (little-endian 8-byte partition encoding, ascending
//! walk with wraparound), so peers that must agree on placements need the
//! same hasher and config.

mod config;
mod error;
mod member;
mod placement;
mod ring;
mod vnodes;


pub use carousel_hash::Hasher;
pub use config::{
    DEFAULT_LOAD_FACTOR, DEFAULT_PARTITION_COUNT, DEFAULT_REPLICATION_FACTOR, RingConfig,
};
pub use error::RingError;
pub use member::Member;
pub use ring::Ring;
