//! Bounded-load partition placement.
//!
//! Every membership change recomputes the full partition table from the
//! virtual-node layout. Each partition hashes onto the ring and is claimed by
//! the first member, walking clockwise, whose running load stays at or below
//! the cap `ceil(P/M * L)`. The walk is what bounds the load: a member at the
//! cap is skipped no matter how much of the key space its virtual nodes cover.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::error::RingError;
use crate::member::Member;
use crate::vnodes::VnodeIndex;

/// A freshly computed partition table and its per-member load counts.
#[derive(Debug)]
pub(crate) struct Placement<M> {
    /// `partition id → owner`, total: one entry per partition.
    pub partitions: Vec<Arc<M>>,
    /// `member name → owned partition count`. Members that received no
    /// partitions do not appear.
    pub loads: HashMap<String, usize>,
}

impl<M> Placement<M> {
    pub fn empty() -> Self {
        Self {
            partitions: Vec::new(),
            loads: HashMap::new(),
        }
    }
}

/// Assign every partition to a member, respecting the load cap.
///
/// Partitions are processed in ascending id order and the load state carries
/// across them, so the result is reproducible for a given
/// `(members, hasher, P, R, L)` but order-dependent internally. Each
/// partition id is hashed from its **little-endian 8-byte** encoding; any
/// peer reproducing placements must match that encoding.
pub(crate) fn distribute<M: Member>(
    config: &ResolvedConfig,
    index: &VnodeIndex<M>,
    member_count: usize,
) -> Result<Placement<M>, RingError> {
    if member_count == 0 {
        return Ok(Placement::empty());
    }

    let cap = config.max_load(member_count);
    let mut partitions = Vec::with_capacity(config.partition_count);
    let mut loads: HashMap<String, usize> = HashMap::new();

    for partition in 0..config.partition_count {
        let key = config.hasher.sum64(&(partition as u64).to_le_bytes());
        let start = index.start_index(key);

        let owner = index.walk_from(start).find(|member| {
            loads.get(&member.name()).copied().unwrap_or(0) < cap
        });

        match owner {
            Some(member) => {
                *loads.entry(member.name()).or_insert(0) += 1;
                partitions.push(Arc::clone(member));
            }
            // One full revolution found every member at the cap.
            None => {
                return Err(RingError::InsufficientSpace {
                    partition,
                    cap,
                    members: member_count,
                    vnodes: index.len(),
                });
            }
        }
    }

    Ok(Placement { partitions, loads })
}
