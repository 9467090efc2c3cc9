#![doc = include_str!("../README.md")]

use anyhow::Context;
use clap::Parser;
use core::time::Duration;
use ringuid::{
    CachedUidGenerator, FileWorkerIdCache, InMemoryWorkerIdAssigner, UidConfig,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Mint, decode, and benchmark cached UIDs.
///
/// The demo uses the in-memory worker slot store; production deployments
/// plug a durable `WorkerIdAssigner` into the library instead.
#[derive(Parser, Debug)]
#[command(name = "ringuid", version, about)]
struct CliArgs {
    /// Number of UIDs to mint.
    #[arg(long, env = "RINGUID_COUNT", default_value_t = 10)]
    count: u64,

    /// Timestamp field width, in bits (seconds since the epoch).
    #[arg(long, env = "RINGUID_TIME_BITS", default_value_t = 28)]
    time_bits: u32,

    /// Worker-id field width, in bits.
    #[arg(long, env = "RINGUID_WORKER_BITS", default_value_t = 22)]
    worker_bits: u32,

    /// Sequence field width, in bits.
    #[arg(long, env = "RINGUID_SEQ_BITS", default_value_t = 13)]
    seq_bits: u32,

    /// Ring-buffer boost exponent: capacity = 2^seq_bits << boost_power.
    #[arg(long, env = "RINGUID_BOOST_POWER", default_value_t = 3)]
    boost_power: u32,

    /// Occupancy percentage floor that triggers a refill, in (0, 100).
    #[arg(long, env = "RINGUID_PADDING_FACTOR", default_value_t = 50)]
    padding_factor: u32,

    /// Fixed-period forced refill in seconds; 0 disables the scheduler.
    #[arg(long, env = "RINGUID_SCHEDULE_INTERVAL", default_value_t = 0)]
    schedule_interval: u64,

    /// Reclaim a previously cached worker id on restart.
    #[arg(long, env = "RINGUID_REUSABLE", default_value_t = false)]
    reusable: bool,

    /// Directory for the worker identity cache (used with --reusable).
    #[arg(long, env = "RINGUID_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Print every minted UID with its decoded fields.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = UidConfig::default()
        .time_bits(args.time_bits)
        .worker_bits(args.worker_bits)
        .seq_bits(args.seq_bits)
        .boost_power(args.boost_power)
        .padding_factor(args.padding_factor)
        .schedule_interval(Duration::from_secs(args.schedule_interval))
        .reusable(args.reusable);

    let mut builder = CachedUidGenerator::builder(config);
    if let Some(dir) = &args.cache_dir {
        builder = builder.identity_cache(Box::new(FileWorkerIdCache::new(dir)));
    }
    let generator = builder
        .build(InMemoryWorkerIdAssigner::new())
        .context("failed to construct the UID generator")?;

    tracing::info!(
        worker_id = generator.worker_id(),
        node = %generator.node(),
        layout = %generator.layout(),
        available = generator.available(),
        "generator ready"
    );

    let start = Instant::now();
    let mut first = None;
    let mut last = None;
    for _ in 0..args.count {
        let uid = generator.next_id().context("UID generation failed")?;
        if args.verbose {
            println!("{}", generator.format(uid));
        }
        first.get_or_insert(uid);
        last = Some(uid);
    }
    let elapsed = start.elapsed();

    if let (Some(first), Some(last)) = (first, last) {
        if !args.verbose {
            println!("first: {}", generator.format(first));
            println!("last:  {}", generator.format(last));
        }
        let rate = args.count as f64 / elapsed.as_secs_f64();
        println!(
            "minted {} UIDs in {:?} ({:.0}/s), worker id {}",
            args.count,
            elapsed,
            rate,
            generator.worker_id()
        );
    }

    Ok(())
}
