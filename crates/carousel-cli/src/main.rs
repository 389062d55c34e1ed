//! `carousel` — route keys across a set of gateways from the command line.
//!
//! # Usage
//!
//! ```text
//! carousel route -m gw1:10.0.0.1:8080 -m gw2:10.0.0.2:8080 user:1001 user:1002
//! carousel route -m ... --replicas 2 session:42
//! carousel distribution -m gw1:10.0.0.1:8080 -m gw2:10.0.0.2:8080 [--json]
//! carousel churn -m gw1:... -m gw2:... --add gw3:10.0.0.3:8080 --remove gw1:10.0.0.1:8080
//! ```

mod member;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use carousel_hash::{Crc64Hasher, Fnv1aHasher, Hasher};
use carousel_ring::{Member, Ring, RingConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use member::GatewayMember;

#[derive(Parser)]
#[command(name = "carousel", version, about = "Bounded-load consistent hash routing")]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which gateway owns each key.
    Route {
        #[command(flatten)]
        ring: RingArgs,

        /// Keys to route.
        #[arg(required = true)]
        keys: Vec<String>,

        /// Number of distinct gateways to list per key, primary first.
        #[arg(short, long, default_value = "1")]
        replicas: usize,
    },

    /// Show how partitions are distributed across the gateways.
    Distribution {
        #[command(flatten)]
        ring: RingArgs,

        /// Emit the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Apply membership changes and report how many partitions moved.
    Churn {
        #[command(flatten)]
        ring: RingArgs,

        /// Gateway to add (repeatable).
        #[arg(long)]
        add: Vec<GatewayMember>,

        /// Gateway identity to remove (repeatable), as `id:host:port`.
        #[arg(long)]
        remove: Vec<String>,
    },
}

/// Ring parameters shared by every subcommand.
#[derive(Args)]
struct RingArgs {
    /// Gateway in `id:host:port` form (repeatable).
    #[arg(short, long = "member", required = true)]
    members: Vec<GatewayMember>,

    /// Partition count. 0 picks the default (271).
    #[arg(long, default_value = "0")]
    partitions: usize,

    /// Virtual nodes per gateway. The default keeps the load cap
    /// `ceil(P/M * L)` within twice this count for any fleet size at the
    /// default partition count; the library default of 20 needs nine or
    /// more gateways.
    #[arg(long, default_value = "180")]
    vnodes: usize,

    /// Load factor. 0 picks the default (1.25).
    #[arg(long, default_value = "0")]
    load_factor: f64,

    /// Hash function. Peers must agree on this to reproduce placements.
    #[arg(long, value_enum, default_value_t = HasherKind::Fnv1a)]
    hasher: HasherKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HasherKind {
    /// FNV-1a 64-bit.
    Fnv1a,
    /// CRC-64 with the ISO polynomial.
    Crc64,
}

impl HasherKind {
    fn build(self) -> Arc<dyn Hasher> {
        match self {
            HasherKind::Fnv1a => Arc::new(Fnv1aHasher),
            HasherKind::Crc64 => Arc::new(Crc64Hasher),
        }
    }
}

impl RingArgs {
    fn build(&self) -> Result<Ring<GatewayMember>> {
        let config = RingConfig::new(self.hasher.build())
            .with_partition_count(self.partitions)
            .with_replication_factor(self.vnodes)
            .with_load_factor(self.load_factor);
        debug!(
            members = self.members.len(),
            partitions = self.partitions,
            vnodes = self.vnodes,
            "building ring"
        );
        Ring::new(self.members.clone(), config).context("failed to build ring")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Route {
            ring,
            keys,
            replicas,
        } => cmd_route(&ring, &keys, replicas),
        Commands::Distribution { ring, json } => cmd_distribution(&ring, json),
        Commands::Churn { ring, add, remove } => cmd_churn(&ring, add, &remove),
    }
}

fn cmd_route(args: &RingArgs, keys: &[String], replicas: usize) -> Result<()> {
    let ring = args.build()?;

    for key in keys {
        let partition = ring.partition_of(key);
        if replicas <= 1 {
            let owner = ring.locate(key).context("ring is empty")?;
            println!("{key} -> partition {partition} -> {owner}");
        } else {
            let members = ring
                .closest_n(key, replicas)
                .with_context(|| format!("cannot pick {replicas} replicas for {key:?}"))?;
            let listed: Vec<String> = members.iter().map(|m| m.to_string()).collect();
            println!("{key} -> partition {partition} -> {}", listed.join(", "));
        }
    }
    Ok(())
}

/// Serializable form of the load distribution.
#[derive(Serialize)]
struct DistributionReport {
    partition_count: usize,
    member_count: usize,
    average_load: f64,
    /// `member identity → owned partition count`, sorted by identity.
    loads: BTreeMap<String, usize>,
}

fn cmd_distribution(args: &RingArgs, json: bool) -> Result<()> {
    let ring = args.build()?;

    let report = DistributionReport {
        partition_count: ring.partition_count(),
        member_count: ring.member_count(),
        average_load: ring.average_load(),
        loads: ring.load_distribution().into_iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} partitions across {} gateways (target load {:.2})",
        report.partition_count, report.member_count, report.average_load
    );
    for (name, load) in &report.loads {
        println!("  {name:<40} {load:>5}");
    }
    Ok(())
}

fn cmd_churn(args: &RingArgs, add: Vec<GatewayMember>, remove: &[String]) -> Result<()> {
    let ring = args.build()?;
    let before: Vec<String> = (0..ring.partition_count())
        .filter_map(|p| ring.partition_owner(p).map(|m| m.name()))
        .collect();

    for gateway in add {
        println!("+ {gateway}");
        ring.add(gateway)?;
    }
    for name in remove {
        println!("- {name}");
        ring.remove_by_name(name)?;
    }

    let after: Vec<String> = (0..ring.partition_count())
        .filter_map(|p| ring.partition_owner(p).map(|m| m.name()))
        .collect();

    if after.is_empty() {
        println!("ring is now empty; all {} partitions unowned", before.len());
        return Ok(());
    }

    let moved = before
        .iter()
        .zip(after.iter())
        .filter(|(b, a)| b != a)
        .count();
    println!(
        "{moved}/{} partitions changed owner ({:.1}%)",
        before.len(),
        100.0 * moved as f64 / before.len() as f64
    );

    print_loads(&ring);
    Ok(())
}

fn print_loads(ring: &Ring<GatewayMember>) {
    let loads: BTreeMap<String, usize> = ring.load_distribution().into_iter().collect();
    for (name, load) in &loads {
        println!("  {name:<40} {load:>5}");
    }
}
