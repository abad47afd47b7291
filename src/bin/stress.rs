//! StashKV Stress Binary
//!
//! Spawns N virtual users that race to acquire the shared store and then run
//! a mixed set/get/scan/delete workload against it.

use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam::channel;
use stashkv::{StashError, StoreConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// StashKV stress runner
#[derive(Parser, Debug)]
#[command(name = "stashkv-stress")]
#[command(about = "Concurrent workload against one shared StashKV handle")]
#[command(version)]
struct Args {
    /// Number of concurrent virtual users
    #[arg(short, long, default_value = "32")]
    vus: usize,

    /// Iterations per virtual user
    #[arg(short, long, default_value = "1000")]
    iterations: usize,

    /// Storage directory (defaults to /tmp/stashkv)
    #[arg(short, long, default_value = "")]
    location: String,

    /// Use a transient in-memory store
    #[arg(long)]
    in_memory: bool,

    /// TTL in seconds applied to every other write (0 disables)
    #[arg(short, long, default_value = "0")]
    ttl: u64,
}

/// Per-VU results sent back over the channel
#[derive(Debug, Default)]
struct VuReport {
    ops: u64,
    not_found: u64,
    errors: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stashkv=debug,redb=error"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("StashKV stress v{}", stashkv::VERSION);
    tracing::info!("Virtual users: {}, iterations: {}", args.vus, args.iterations);

    let config = StoreConfig::new(&args.location, args.in_memory);
    let (tx, rx) = channel::unbounded::<Result<VuReport, StashError>>();
    let started = Instant::now();

    let scoped = crossbeam::scope(|s| {
        for vu in 0..args.vus {
            let tx = tx.clone();
            let config = config.clone();
            let iterations = args.iterations;
            let ttl = args.ttl;
            s.spawn(move |_| {
                if tx.send(run_vu(vu, config, iterations, ttl)).is_err() {
                    tracing::warn!(vu, "Report channel closed, dropping result");
                }
            });
        }
    });
    drop(tx);

    if scoped.is_err() {
        tracing::error!("A virtual user panicked");
        std::process::exit(1);
    }

    let mut total = VuReport::default();
    let mut failed_vus = 0;
    for report in rx {
        match report {
            Ok(r) => {
                total.ops += r.ops;
                total.not_found += r.not_found;
                total.errors += r.errors;
            }
            Err(e) => {
                tracing::error!("Virtual user failed: {}", e);
                failed_vus += 1;
            }
        }
    }

    let elapsed = started.elapsed();
    let rate = total.ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    tracing::info!(
        ops = total.ops,
        not_found = total.not_found,
        errors = total.errors,
        failed_vus,
        opens = stashkv::handle::global().open_count(),
        "Finished in {:.2?} ({:.0} ops/s)",
        elapsed,
        rate
    );

    if failed_vus > 0 || total.errors > 0 {
        std::process::exit(1);
    }
}

/// One virtual user: acquire the shared handle, then loop the workload
fn run_vu(vu: usize, config: StoreConfig, iterations: usize, ttl: u64) -> Result<VuReport, StashError> {
    let store = stashkv::acquire(config)?;
    let mut report = VuReport::default();
    let prefix = format!("vu:{}:", vu);

    for i in 0..iterations {
        let key = format!("{}{}", prefix, i);
        let value = i.to_string();

        let write = if ttl > 0 && i % 2 == 1 {
            store.set_with_ttl(key.as_bytes(), value.as_bytes(), Duration::from_secs(ttl))
        } else {
            store.set(key.as_bytes(), value.as_bytes())
        };
        tally(&mut report, write);
        tally(&mut report, store.get(key.as_bytes()).map(|_| ()));

        if i % 10 == 9 {
            tally(&mut report, store.view_prefix(prefix.as_bytes()).map(|_| ()));
            tally(&mut report, store.delete(key.as_bytes()).map(|_| ()));
        }
    }

    tracing::debug!(vu, ops = report.ops, "Virtual user done");
    Ok(report)
}

fn tally(report: &mut VuReport, outcome: Result<(), StashError>) {
    report.ops += 1;
    match outcome {
        Ok(()) => {}
        Err(e) if e.is_not_found() => report.not_found += 1,
        Err(e) => {
            tracing::warn!("Operation failed: {}", e);
            report.errors += 1;
        }
    }
}
