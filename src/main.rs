// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Command-line front end: solve single N values or ranges, inspect the
//! result store, validate candidate sets.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use sidon_search::runner::{run_range, run_single, RunOptions};
use sidon_search::search::format_set;
use sidon_search::store::{JsonStore, ResultStore};
use sidon_search::{is_valid_sidon_set, ManagerKind};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Search for sets with pairwise-distinct subset sums")]
struct Cli {
    /// Path to the results store
    #[arg(long = "db", default_value = "sidon_results.json", global = true)]
    db: PathBuf,

    /// Verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve for a single N
    Solve {
        n: u32,
        /// Enumerate every optimal set, not just one witness
        #[arg(short, long)]
        all: bool,
        /// Stop at the first complete set found
        #[arg(short, long)]
        first_only: bool,
        /// Force the memory-free iterative manager
        #[arg(long)]
        iterative: bool,
        /// Initial candidate bound (0 = default 2^(N-1)+1, or the store's)
        #[arg(long, default_value_t = 0)]
        bound: u64,
        /// Seconds between progress log lines
        #[arg(long, default_value_t = 60)]
        log_interval: u64,
    },
    /// Solve a range of N values across worker threads
    Range {
        /// First N (0 = resume after the last solved N in the store)
        #[arg(short, long, default_value_t = 0)]
        start: u32,
        /// Last N
        #[arg(short, long)]
        max: u32,
        /// Number of parallel workers
        #[arg(short, long, default_value_t = 1)]
        workers: u32,
        /// Enumerate every optimal set, not just one witness
        #[arg(short, long)]
        all: bool,
        /// Stop each search at its first complete set
        #[arg(short, long)]
        first_only: bool,
    },
    /// Show stored results (all, or for one N)
    Show { n: Option<u32> },
    /// Show store statistics
    Stats,
    /// Check whether the given values have pairwise-distinct subset sums
    Check { values: Vec<u64> },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop_flag);
        if let Err(err) = ctrlc::set_handler(move || {
            warn!("interrupt received, stopping searches");
            stop.store(true, Ordering::Release);
        }) {
            warn!("could not install Ctrl-C handler: {err}");
        }
    }

    match run(cli, &stop_flag) {
        Ok(()) if stop_flag.load(Ordering::Acquire) => ExitCode::from(1),
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli, stop_flag: &Arc<AtomicBool>) -> Result<()> {
    match cli.command {
        Command::Solve {
            n,
            all,
            first_only,
            iterative,
            bound,
            log_interval,
        } => {
            let store = open_store(&cli.db)?;
            let options = RunOptions {
                find_all_optimal: all,
                first_only,
                manager_kind: if iterative {
                    ManagerKind::Iterative
                } else {
                    ManagerKind::Fast
                },
                initial_bound: bound,
                log_interval: Duration::from_secs(log_interval.max(1)),
            };
            match run_single(n, &store, &options, stop_flag)? {
                Some(result) => {
                    println!(
                        "N={}: status={}, max={}, set={}, nodes={}, time={:.2}s",
                        result.n,
                        result.status,
                        result.max_value,
                        format_set(&result.set),
                        result.nodes_explored,
                        result.computation_time
                    );
                    if all {
                        for set in store
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner)
                            .optimal_sets(n)?
                        {
                            println!("  optimal: {}", format_set(&set));
                        }
                    }
                }
                None => println!("N={n} is already solved (see `show {n}`)"),
            }
        }
        Command::Range {
            start,
            max,
            workers,
            all,
            first_only,
        } => {
            if max == 0 {
                bail!("--max must be at least 1");
            }
            let store = open_store(&cli.db)?;
            let options = RunOptions {
                find_all_optimal: all,
                first_only,
                ..RunOptions::default()
            };
            run_range(start, max, workers, &store, &options, stop_flag)?;
        }
        Command::Show { n } => {
            let store = JsonStore::open(&cli.db)?;
            let results = store.results()?;
            let selected: Vec<_> = results
                .iter()
                .filter(|r| n.map_or(true, |n| r.n == n))
                .collect();
            if selected.is_empty() {
                println!("no stored results");
            }
            for result in selected {
                println!(
                    "N={}: status={}, max={}, set={}, nodes={}, time={:.2}s",
                    result.n,
                    result.status,
                    result.max_value,
                    format_set(&result.set),
                    result.nodes_explored,
                    result.computation_time
                );
                if let Some(n) = n {
                    for set in store.optimal_sets(n)? {
                        println!("  optimal: {}", format_set(&set));
                    }
                }
            }
        }
        Command::Stats => {
            let store = JsonStore::open(&cli.db)?;
            let stats = store.stats()?;
            println!("Store statistics:");
            println!("  total results:     {}", stats.total_results);
            println!("  optimal results:   {}", stats.optimal_results);
            println!("  max N solved:      {}", stats.max_n_solved);
            println!(
                "  total compute time: {:.2}s",
                stats.total_computation_time
            );
        }
        Command::Check { values } => {
            if values.is_empty() {
                bail!("provide at least one value to check");
            }
            if is_valid_sidon_set(&values) {
                println!("{} has pairwise-distinct subset sums", format_set(&values));
            } else {
                println!("{} has a subset-sum collision", format_set(&values));
            }
        }
    }
    Ok(())
}

fn open_store(path: &PathBuf) -> Result<Mutex<JsonStore>> {
    let store =
        JsonStore::open(path).with_context(|| format!("open store {}", path.display()))?;
    Ok(Mutex::new(store))
}
