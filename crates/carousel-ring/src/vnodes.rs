//! Virtual-node index: the hash ring itself.
//!
//! Each member occupies `replication_factor` positions on a `u64` ring. The
//! index keeps a position → member map alongside a sorted array of positions
//! so that lookups can binary-search and then walk clockwise with wraparound.

use std::collections::HashMap;
use std::sync::Arc;

use carousel_hash::Hasher;

use crate::member::Member;

/// The byte string hashed for a member's i-th virtual node: the member name
/// followed by the ASCII decimal index, no separator. Peers reproducing
/// placements must build the same bytes.
fn vnode_key(name: &str, index: usize) -> Vec<u8> {
    format!("{name}{index}").into_bytes()
}

/// Sorted virtual-node layout for a set of members.
///
/// Hash collisions between two members' virtual nodes resolve last-writer-wins
/// within a mutation; the sorted array is kept deduplicated so every entry has
/// a live owner in the map.
#[derive(Debug, Clone)]
pub(crate) struct VnodeIndex<M> {
    /// Ring position → owning member.
    ring: HashMap<u64, Arc<M>>,
    /// All ring positions, ascending.
    sorted: Vec<u64>,
}

impl<M: Member> VnodeIndex<M> {
    pub fn new() -> Self {
        Self {
            ring: HashMap::new(),
            sorted: Vec::new(),
        }
    }

    /// Insert `replication_factor` virtual nodes for `member`.
    pub fn add(&mut self, hasher: &dyn Hasher, member: &Arc<M>, replication_factor: usize) {
        let name = member.name();
        for i in 0..replication_factor {
            let position = hasher.sum64(&vnode_key(&name, i));
            if self.ring.insert(position, Arc::clone(member)).is_none() {
                self.sorted.push(position);
            }
        }
        self.sorted.sort_unstable();
    }

    /// Delete the virtual nodes of the member named `name`.
    ///
    /// Positions already absent (overwritten by a colliding virtual node and
    /// removed with its owner) are skipped.
    pub fn remove(&mut self, hasher: &dyn Hasher, name: &str, replication_factor: usize) {
        for i in 0..replication_factor {
            let position = hasher.sum64(&vnode_key(name, i));
            if self.ring.remove(&position).is_some()
                && let Ok(idx) = self.sorted.binary_search(&position)
            {
                self.sorted.remove(idx);
            }
        }
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Index of the first position at or after `hash`, wrapping to 0 past the
    /// end of the array.
    pub fn start_index(&self, hash: u64) -> usize {
        let idx = self.sorted.partition_point(|&p| p < hash);
        if idx == self.sorted.len() { 0 } else { idx }
    }

    /// Walk the ring clockwise from the array index `start`, wrapping, for
    /// exactly one full revolution.
    pub fn walk_from(&self, start: usize) -> impl Iterator<Item = &Arc<M>> + '_ {
        let len = self.sorted.len();
        (0..len).map(move |step| {
            let position = self.sorted[(start + step) % len];
            &self.ring[&position]
        })
    }
}
