//! The bounded-load consistent hash ring.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::{ResolvedConfig, RingConfig};
use crate::error::RingError;
use crate::member::Member;
use crate::placement::{self, Placement};
use crate::vnodes::VnodeIndex;

/// Everything a reader needs in one consistent snapshot: the registry, the
/// virtual-node layout, the partition table, and the load counts. Guarded by
/// the single ring lock; finer-grained locking would let a reader observe a
/// partition table from one membership epoch with loads from another.
struct RingState<M> {
    /// Member registry: the authoritative instance per name.
    members: HashMap<String, Arc<M>>,
    /// Virtual-node layout of the current membership.
    index: VnodeIndex<M>,
    /// `partition id → owner`. Total when the ring is non-empty, empty
    /// otherwise.
    partitions: Vec<Arc<M>>,
    /// `member name → owned partition count`.
    loads: HashMap<String, usize>,
    /// Lazy member list, invalidated on every membership change.
    member_cache: Option<Vec<Arc<M>>>,
}

/// A consistent hash ring that bounds the load of every member.
///
/// Keys map to one of a fixed number of partitions (`hash mod P`), and
/// partitions map to members through a placement pass that caps each member
/// at `ceil(P/M * L)` partitions. Adding or removing a member moves few
/// partitions; no amount of key skew pushes a member past the cap.
///
/// Handles returned by [`locate`](Ring::locate) and
/// [`closest_n`](Ring::closest_n) are shared (`Arc`) — they remain valid
/// after the member is removed from the ring, until the caller drops them.
///
/// All methods take `&self`; readers run concurrently and mutations
/// serialize on an internal reader/writer lock.
pub struct Ring<M: Member> {
    config: ResolvedConfig,
    state: RwLock<RingState<M>>,
}

impl<M: Member> Ring<M> {
    /// Build a ring over an initial (possibly empty) set of members.
    ///
    /// Zero-valued config fields adopt the defaults; see [`RingConfig`].
    /// Fails if the config has no hasher, or if the per-member cap
    /// `ceil(P/M * L)` exceeds twice the replication factor for this member
    /// count — configuration errors only ever surface here, never from a
    /// later query or mutation.
    pub fn new(members: Vec<M>, config: RingConfig) -> Result<Self, RingError> {
        let config = config.resolve(members.len())?;

        let mut state = RingState {
            members: HashMap::new(),
            index: VnodeIndex::new(),
            partitions: Vec::new(),
            loads: HashMap::new(),
            member_cache: None,
        };

        for member in members {
            let member = Arc::new(member);
            let name = member.name();
            if state.members.insert(name, Arc::clone(&member)).is_none() {
                state
                    .index
                    .add(config.hasher.as_ref(), &member, config.replication_factor);
            }
        }

        let placement = placement::distribute(&config, &state.index, state.members.len())?;
        state.partitions = placement.partitions;
        state.loads = placement.loads;

        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    /// Add a member. Adding a name that is already present is a no-op.
    ///
    /// The membership change and the resulting re-placement commit together:
    /// if placement fails, the ring is left exactly as it was.
    pub fn add(&self, member: M) -> Result<(), RingError> {
        let name = member.name();

        {
            let state = self.state.read().expect("ring lock poisoned");
            if state.members.contains_key(&name) {
                return Ok(());
            }
        }

        let mut state = self.state.write().expect("ring lock poisoned");
        // Another writer may have won the race between the two locks.
        if state.members.contains_key(&name) {
            return Ok(());
        }

        let member = Arc::new(member);
        let mut index = state.index.clone();
        index.add(
            self.config.hasher.as_ref(),
            &member,
            self.config.replication_factor,
        );

        let member_count = state.members.len() + 1;
        let placement = placement::distribute(&self.config, &index, member_count)?;

        state.members.insert(name.clone(), member);
        self.publish(&mut state, index, placement);
        debug!(member = %name, members = member_count, "added member to ring");
        Ok(())
    }

    /// Remove the member named `name`. Removing an absent name is a no-op.
    ///
    /// The registry entry is dropped only after every reference in the
    /// virtual-node layout and the partition table has been replaced;
    /// outstanding handles keep the member alive until their holders drop
    /// them.
    pub fn remove_by_name(&self, name: &str) -> Result<(), RingError> {
        {
            let state = self.state.read().expect("ring lock poisoned");
            if !state.members.contains_key(name) {
                return Ok(());
            }
        }

        let mut state = self.state.write().expect("ring lock poisoned");
        if !state.members.contains_key(name) {
            return Ok(());
        }

        let mut index = state.index.clone();
        index.remove(
            self.config.hasher.as_ref(),
            name,
            self.config.replication_factor,
        );

        let member_count = state.members.len() - 1;
        let placement = placement::distribute(&self.config, &index, member_count)?;

        state.members.remove(name);
        self.publish(&mut state, index, placement);
        debug!(member = %name, members = member_count, "removed member from ring");
        Ok(())
    }

    /// Remove `member` by its identity. Equivalent to
    /// [`remove_by_name`](Ring::remove_by_name) with `member.name()`.
    pub fn remove(&self, member: &M) -> Result<(), RingError> {
        self.remove_by_name(&member.name())
    }

    /// Atomically replace the published layout, table, and loads.
    fn publish(&self, state: &mut RingState<M>, index: VnodeIndex<M>, placement: Placement<M>) {
        state.index = index;
        state.partitions = placement.partitions;
        state.loads = placement.loads;
        state.member_cache = None;
    }

    /// The member that owns `key`, or `None` when the ring is empty.
    pub fn locate(&self, key: impl AsRef<[u8]>) -> Option<Arc<M>> {
        let state = self.state.read().expect("ring lock poisoned");
        state.partitions.get(self.partition_for(key.as_ref())).cloned()
    }

    /// The partition `key` belongs to: `hasher(key) mod partition_count`.
    ///
    /// A pure function of the configuration — it is defined even for an
    /// empty ring, where the partition merely has no owner yet.
    pub fn partition_of(&self, key: impl AsRef<[u8]>) -> usize {
        self.partition_for(key.as_ref())
    }

    fn partition_for(&self, key: &[u8]) -> usize {
        (self.config.hasher.sum64(key) % self.config.partition_count as u64) as usize
    }

    /// The member owning `partition`, or `None` when the ring is empty or
    /// the id is out of range.
    pub fn partition_owner(&self, partition: usize) -> Option<Arc<M>> {
        let state = self.state.read().expect("ring lock poisoned");
        state.partitions.get(partition).cloned()
    }

    /// Up to `n` distinct members for `key`, starting with its partition's
    /// owner and continuing clockwise around the ring from the owner's own
    /// position. Useful as a replica set: the list depends only on the owner,
    /// so every key of a partition sees the same successors.
    ///
    /// `n == 0` returns an empty list; `n` above the member count is an
    /// [`RingError::InsufficientMembers`] error.
    pub fn closest_n(&self, key: impl AsRef<[u8]>, n: usize) -> Result<Vec<Arc<M>>, RingError> {
        self.closest_n_for_partition(self.partition_for(key.as_ref()), n)
    }

    /// Like [`closest_n`](Ring::closest_n), keyed by partition id.
    pub fn closest_n_for_partition(
        &self,
        partition: usize,
        n: usize,
    ) -> Result<Vec<Arc<M>>, RingError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let state = self.state.read().expect("ring lock poisoned");
        if n > state.members.len() {
            return Err(RingError::InsufficientMembers {
                requested: n,
                available: state.members.len(),
            });
        }

        let Some(owner) = state.partitions.get(partition) else {
            return Err(RingError::InsufficientMembers {
                requested: n,
                available: state.members.len(),
            });
        };

        // Anchor the walk at the owner's name hash rather than the
        // partition's, so the successor list is a property of the owner.
        let start = state
            .index
            .start_index(self.config.hasher.sum64(owner.name().as_bytes()));

        let mut result = Vec::with_capacity(n);
        let mut seen = HashSet::new();
        for member in state.index.walk_from(start) {
            if seen.insert(member.name()) {
                result.push(Arc::clone(member));
                if result.len() == n {
                    break;
                }
            }
        }
        Ok(result)
    }

    /// Independent copies of every member, in no particular order.
    pub fn members(&self) -> Vec<M> {
        {
            let state = self.state.read().expect("ring lock poisoned");
            if let Some(cached) = &state.member_cache {
                return cached.iter().map(|m| (**m).clone()).collect();
            }
        }

        let mut state = self.state.write().expect("ring lock poisoned");
        let RingState {
            members,
            member_cache,
            ..
        } = &mut *state;
        let cached = member_cache.get_or_insert_with(|| members.values().cloned().collect());
        cached.iter().map(|m| (**m).clone()).collect()
    }

    /// Number of members currently in the ring.
    pub fn member_count(&self) -> usize {
        self.state.read().expect("ring lock poisoned").members.len()
    }

    /// Snapshot of the per-member partition counts. Sums to the partition
    /// count whenever the ring is non-empty.
    pub fn load_distribution(&self) -> HashMap<String, usize> {
        self.state.read().expect("ring lock poisoned").loads.clone()
    }

    /// The target load per member, `(P / M) * L`, as a real number — the
    /// placement cap is this value's ceiling. Zero when the ring is empty.
    pub fn average_load(&self) -> f64 {
        let state = self.state.read().expect("ring lock poisoned");
        self.config.average_load(state.members.len())
    }

    /// The configured partition count.
    pub fn partition_count(&self) -> usize {
        self.config.partition_count
    }
}

impl<M: Member> fmt::Debug for Ring<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().expect("ring lock poisoned");
        f.debug_struct("Ring")
            .field("partition_count", &self.config.partition_count)
            .field("replication_factor", &self.config.replication_factor)
            .field("load_factor", &self.config.load_factor)
            .field("members", &state.members.len())
            .finish_non_exhaustive()
    }
}
