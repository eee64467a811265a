//! lsmkit Workload Driver
//!
//! Runs a skewed read/write workload against an in-memory engine and reports
//! cache effectiveness.

use std::time::Instant;

use clap::Parser;
use lsmkit::{Config, Engine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

/// lsmkit workload driver
#[derive(Parser, Debug)]
#[command(name = "lsmkit-workload")]
#[command(about = "Drive a skewed read/write workload through the memtable and cache")]
#[command(version)]
struct Args {
    /// Worker threads
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Operations per thread
    #[arg(short, long, default_value = "100000")]
    ops: usize,

    /// Distinct keys
    #[arg(short, long, default_value = "10000")]
    keys: usize,

    /// Percentage of operations that are reads
    #[arg(short, long, default_value = "90")]
    read_percent: u32,

    /// Cache capacity in entries
    #[arg(short, long, default_value = "1024")]
    cache_capacity: usize,

    /// Initial arena size in MB
    #[arg(short = 'a', long, default_value = "16")]
    arena_mb: usize,

    /// Seed for key selection and tower heights
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lsmkit=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("lsmkit workload v{}", lsmkit::VERSION);

    let config = Config::builder()
        .arena_size(args.arena_mb * 1024 * 1024)
        .cache_capacity(args.cache_capacity)
        .rng_seed(args.seed)
        .build();

    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to create engine: {}", e);
            std::process::exit(1);
        }
    };

    let started = Instant::now();
    let result = crossbeam::thread::scope(|scope| {
        for worker in 0..args.threads {
            let engine = &engine;
            let args = &args;
            scope.spawn(move |_| run_worker(engine, args, worker as u64));
        }
    });
    if result.is_err() {
        tracing::error!("A worker thread panicked");
        std::process::exit(1);
    }
    let elapsed = started.elapsed();

    let stats = engine.cache_stats();
    let total_ops = args.threads * args.ops;
    tracing::info!(
        total_ops,
        elapsed_ms = elapsed.as_millis() as u64,
        ops_per_sec = (total_ops as f64 / elapsed.as_secs_f64()) as u64,
        "Workload finished"
    );
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        hit_ratio = stats.hit_ratio(),
        "Cache statistics"
    );
    tracing::info!(
        entries = engine.memtable().entry_count(),
        bytes = engine.memtable().size(),
        arena_bytes = engine.memtable().arena_size(),
        should_flush = engine.should_flush(),
        "Memtable statistics"
    );
}

/// Keys are drawn with a cubic skew: low ids are far more popular
fn run_worker(engine: &Engine, args: &Args, worker: u64) {
    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(worker));

    for op in 0..args.ops {
        let id = (rng.gen::<f64>().powi(3) * args.keys as f64) as usize;
        let key = format!("key{:08}", id);

        let outcome = if rng.gen_range(0..100) < args.read_percent {
            engine.get(key.as_bytes()).map(|_| ())
        } else {
            engine.put(key.into_bytes(), format!("value-{}-{}", worker, op).into_bytes())
        };

        if let Err(e) = outcome {
            tracing::error!(worker, op, "Operation failed: {}", e);
            return;
        }
    }
}
