//! Error types for the ring crate.

/// Errors produced by ring construction, mutation, and replica queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RingError {
    /// The configuration carried no hasher.
    #[error("configuration has no hasher")]
    MissingHasher,

    /// The per-member cap `ceil(P/M * L)` exceeds twice the replication
    /// factor, so the placement walk cannot reliably honor it.
    #[error(
        "configuration may cause distribution issues: partition_count={partition_count}, \
         member_count={member_count}, load_factor={load_factor} gives a per-member cap \
         of {cap} partitions"
    )]
    Config {
        /// Configured partition count (P).
        partition_count: usize,
        /// Number of members at construction (M).
        member_count: usize,
        /// Configured load factor (L).
        load_factor: f64,
        /// The computed cap, `ceil(P/M * L)`.
        cap: usize,
    },

    /// A replica query asked for more distinct members than the ring holds.
    #[error("insufficient members: requested {requested}, ring has {available}")]
    InsufficientMembers {
        /// How many distinct members the caller asked for.
        requested: usize,
        /// How many members the ring holds.
        available: usize,
    },

    /// The placement walk visited every virtual node without finding a member
    /// below the load cap. Construction validation makes this unreachable for
    /// accepted configurations.
    #[error(
        "partition {partition} cannot be assigned: cap={cap}, members={members}, \
         virtual nodes={vnodes}"
    )]
    InsufficientSpace {
        /// The partition that could not be placed.
        partition: usize,
        /// The per-member cap in force during placement.
        cap: usize,
        /// Member count during placement.
        members: usize,
        /// Size of the sorted virtual-node array.
        vnodes: usize,
    },
}
