//! Ring configuration and construction-time validation.

use std::sync::Arc;

use carousel_hash::Hasher;

use crate::error::RingError;

/// Default number of partitions. Prime, so `hash mod P` stays well spread
/// even for hashers with structured low bits.
pub const DEFAULT_PARTITION_COUNT: usize = 271;

/// Default number of virtual nodes per member.
pub const DEFAULT_REPLICATION_FACTOR: usize = 20;

/// Default load factor: 25% headroom between the average load and the
/// per-member cap.
pub const DEFAULT_LOAD_FACTOR: f64 = 1.25;

/// Configuration for a [`Ring`](crate::Ring).
///
/// Zero values for `partition_count`, `replication_factor`, and `load_factor`
/// adopt the defaults at construction time. A configuration without a hasher
/// is rejected — placement is a function of the hash values, so there is no
/// sensible default to fall back to.
#[derive(Debug, Clone, Default)]
pub struct RingConfig {
    /// Hash function shared by key location and the virtual-node layout.
    pub hasher: Option<Arc<dyn Hasher>>,
    /// Number of partitions (P). Fixed for the life of the ring.
    pub partition_count: usize,
    /// Virtual nodes per member (R).
    pub replication_factor: usize,
    /// Multiplier controlling the slack between the average load and the
    /// per-member cap (L). Must be at least 1.
    pub load_factor: f64,
}

impl RingConfig {
    /// Create a configuration with the given hasher and default P/R/L.
    pub fn new(hasher: Arc<dyn Hasher>) -> Self {
        Self {
            hasher: Some(hasher),
            ..Self::default()
        }
    }

    /// Override the partition count.
    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    /// Override the number of virtual nodes per member.
    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    /// Override the load factor.
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Fill in defaults and validate against the initial member count.
    pub(crate) fn resolve(self, member_count: usize) -> Result<ResolvedConfig, RingError> {
        let hasher = self.hasher.ok_or(RingError::MissingHasher)?;

        let resolved = ResolvedConfig {
            hasher,
            partition_count: if self.partition_count == 0 {
                DEFAULT_PARTITION_COUNT
            } else {
                self.partition_count
            },
            replication_factor: if self.replication_factor == 0 {
                DEFAULT_REPLICATION_FACTOR
            } else {
                self.replication_factor
            },
            load_factor: if self.load_factor == 0.0 {
                DEFAULT_LOAD_FACTOR
            } else {
                self.load_factor
            },
        };

        resolved.validate(member_count)?;
        Ok(resolved)
    }
}

/// A [`RingConfig`] with defaults applied and validation passed.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub hasher: Arc<dyn Hasher>,
    pub partition_count: usize,
    pub replication_factor: usize,
    pub load_factor: f64,
}

impl ResolvedConfig {
    /// The target load per member, `(P / M) * L`, without ceiling.
    /// Zero for an empty ring.
    pub fn average_load(&self, member_count: usize) -> f64 {
        if member_count == 0 {
            return 0.0;
        }
        self.partition_count as f64 / member_count as f64 * self.load_factor
    }

    /// The per-member partition cap used during placement,
    /// `ceil((P / M) * L)`. The ceiling keeps the cap reachable when the
    /// `P/M * L` product is small.
    pub fn max_load(&self, member_count: usize) -> usize {
        self.average_load(member_count).ceil() as usize
    }

    /// A cap above twice the replication factor outruns the ring positions a
    /// single member occupies; the placement walk cannot reliably honor it.
    fn validate(&self, member_count: usize) -> Result<(), RingError> {
        if member_count == 0 {
            return Ok(());
        }

        let cap = self.max_load(member_count);
        if cap > 2 * self.replication_factor {
            return Err(RingError::Config {
                partition_count: self.partition_count,
                member_count,
                load_factor: self.load_factor,
                cap,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel_hash::Fnv1aHasher;

    fn base_config() -> RingConfig {
        RingConfig::new(Arc::new(Fnv1aHasher))
    }

    #[test]
    fn test_zero_values_adopt_defaults() {
        let resolved = base_config().resolve(10).unwrap();
        assert_eq!(resolved.partition_count, DEFAULT_PARTITION_COUNT);
        assert_eq!(resolved.replication_factor, DEFAULT_REPLICATION_FACTOR);
        assert_eq!(resolved.load_factor, DEFAULT_LOAD_FACTOR);
    }

    #[test]
    fn test_explicit_values_kept() {
        let resolved = base_config()
            .with_partition_count(7)
            .with_replication_factor(4)
            .with_load_factor(1.5)
            .resolve(3)
            .unwrap();
        assert_eq!(resolved.partition_count, 7);
        assert_eq!(resolved.replication_factor, 4);
        assert_eq!(resolved.load_factor, 1.5);
    }

    #[test]
    fn test_missing_hasher_rejected() {
        let err = RingConfig::default().resolve(3).unwrap_err();
        assert_eq!(err, RingError::MissingHasher);
    }

    #[test]
    fn test_empty_ring_skips_validation() {
        // Any P/R/L combination is fine with zero members; validation happens
        // again when members arrive through a fresh construction.
        assert!(
            base_config()
                .with_partition_count(1)
                .with_load_factor(100.0)
                .resolve(0)
                .is_ok()
        );
    }

    #[test]
    fn test_pathological_cap_rejected() {
        // cap = ceil(100/10 * 10.0) = 100 > 2R = 2.
        let err = base_config()
            .with_partition_count(100)
            .with_replication_factor(1)
            .with_load_factor(10.0)
            .resolve(10)
            .unwrap_err();
        match err {
            RingError::Config { cap, .. } => assert_eq!(cap, 100),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_tight_but_valid_cap_accepted() {
        // cap = ceil(100/100 * 1.0) = 1 <= 2R = 2.
        assert!(
            base_config()
                .with_partition_count(100)
                .with_replication_factor(1)
                .with_load_factor(1.0)
                .resolve(100)
                .is_ok()
        );
    }

    #[test]
    fn test_low_load_factor_accepted_within_cap() {
        // Only the cap rule gates construction: cap = ceil(10/20 * 0.9) = 1
        // is within 2R = 2 even though the load factor is below 1.
        assert!(
            base_config()
                .with_partition_count(10)
                .with_replication_factor(1)
                .with_load_factor(0.9)
                .resolve(20)
                .is_ok()
        );
    }

    #[test]
    fn test_cap_at_exactly_twice_replication_accepted() {
        // cap = ceil(40/1 * 1.0) = 40 = 2R: the boundary is inclusive.
        assert!(
            base_config()
                .with_partition_count(40)
                .with_load_factor(1.0)
                .resolve(1)
                .is_ok()
        );
    }

    #[test]
    fn test_default_config_needs_nine_members() {
        // cap = ceil(271/M * 1.25) against 2R = 40: 113 at three members,
        // 38 at nine. Small fleets need a larger replication factor.
        match base_config().resolve(3).unwrap_err() {
            RingError::Config {
                partition_count,
                member_count,
                cap,
                ..
            } => {
                assert_eq!(partition_count, 271);
                assert_eq!(member_count, 3);
                assert_eq!(cap, 113);
            }
            other => panic!("expected Config error, got {other:?}"),
        }
        assert!(base_config().resolve(9).is_ok());
    }

    #[test]
    fn test_average_load_unceiled() {
        let resolved = base_config().with_replication_factor(60).resolve(3).unwrap();
        let expected = 271.0 / 3.0 * 1.25;
        assert!((resolved.average_load(3) - expected).abs() < 1e-9);
        assert_eq!(resolved.max_load(3), 113);
    }

    #[test]
    fn test_average_load_zero_when_empty() {
        let resolved = base_config().resolve(0).unwrap();
        assert_eq!(resolved.average_load(0), 0.0);
    }
}
