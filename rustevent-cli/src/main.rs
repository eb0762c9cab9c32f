//! rustevent CLI
//!
//! Inspects, histograms, filters and converts binary event files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use log::{debug, info};
use rustevent_algorithms::sort::{compare_tof, sort_with_strategy};
use rustevent_algorithms::SortStrategy;
use rustevent_core::{BinEdges, Event, PulseTime};
use rustevent_io::{EventFileReader, EventFileWriter, EventListSnapshot};
use rustevent_list::{EventList, Events, SortConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    RusteventIo(#[from] rustevent_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] rustevent_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Sort strategies disagree: {0}")]
    SortMismatch(String),
}

/// Event-list storage and histogramming for neutron event files.
#[derive(Parser)]
#[command(name = "rustevent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Histogram events into uniform TOF bins
    Histogram {
        /// Input event file
        input: PathBuf,

        /// Lower edge of the first bin
        #[arg(long)]
        min: f64,

        /// Upper edge of the last bin
        #[arg(long)]
        max: f64,

        /// Number of bins
        #[arg(long, default_value = "100")]
        bins: usize,

        /// Write the histogram as CSV instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip error computation
        #[arg(long)]
        skip_errors: bool,
    },

    /// Merge events closer than a TOF tolerance
    Compress {
        /// Input event file
        input: PathBuf,

        /// Output event file
        #[arg(short, long)]
        output: PathBuf,

        /// TOF tolerance (microseconds)
        #[arg(short, long)]
        tolerance: f64,
    },

    /// Keep events with start <= pulse time < stop
    Filter {
        /// Input event file
        input: PathBuf,

        /// Output event file
        #[arg(short, long)]
        output: PathBuf,

        /// Start pulse time (nanoseconds, inclusive)
        #[arg(long)]
        start: i64,

        /// Stop pulse time (nanoseconds, exclusive)
        #[arg(long)]
        stop: i64,
    },

    /// Remove events with min <= TOF <= max
    Mask {
        /// Input event file
        input: PathBuf,

        /// Output event file
        #[arg(short, long)]
        output: PathBuf,

        /// Lower TOF bound (inclusive)
        #[arg(long)]
        min: f64,

        /// Upper TOF bound (inclusive)
        #[arg(long)]
        max: f64,
    },

    /// Convert a JSON snapshot into an event file
    Import {
        /// Input JSON snapshot
        input: PathBuf,

        /// Output event file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert an event file into a JSON snapshot
    Export {
        /// Input event file
        input: PathBuf,

        /// Output JSON snapshot
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Benchmark sort strategies (serial, 2-way, 4-way) on an event file
    SortBenchmark {
        /// Input event file
        input: PathBuf,

        /// Number of iterations
        #[arg(short, long, default_value = "3")]
        iterations: usize,

        /// Worker threads (defaults to all cores)
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn read_list(path: &Path) -> Result<EventList> {
    let reader = EventFileReader::open(path)?;
    Ok(reader.read_list()?)
}

fn write_list(path: &Path, list: &EventList) -> Result<()> {
    let mut writer = EventFileWriter::create(path)?;
    writer.write_event_list(list)?;
    Ok(())
}

/// Times each strategy on copies of `events` and checks they agree on the
/// TOF sequence. Returns `(strategy, mean, min, max)` in milliseconds.
fn benchmark_strategies<E: Event>(
    events: &[E],
    iterations: usize,
) -> Result<Vec<(SortStrategy, f64, f64, f64)>> {
    let mut reference = events.to_vec();
    sort_with_strategy(&mut reference, SortStrategy::Serial, compare_tof);

    let mut rows = Vec::new();
    for strategy in [
        SortStrategy::Serial,
        SortStrategy::TwoWay,
        SortStrategy::FourWay,
    ] {
        let mut times = Vec::with_capacity(iterations);
        for _ in 0..iterations.max(1) {
            let mut copy = events.to_vec();
            let start = Instant::now();
            sort_with_strategy(&mut copy, strategy, compare_tof);
            times.push(start.elapsed().as_secs_f64() * 1000.0);

            let agrees = copy
                .iter()
                .zip(&reference)
                .all(|(a, b)| a.tof().total_cmp(&b.tof()).is_eq());
            if !agrees {
                return Err(CliError::SortMismatch(format!(
                    "{strategy:?} produced a different TOF order than the serial sort"
                )));
            }
        }

        let min_time = times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max_time = times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let mean_time = times.iter().sum::<f64>() / times.len() as f64;
        rows.push((strategy, mean_time, min_time, max_time));
    }
    Ok(rows)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Info { input, json } => {
            let reader = EventFileReader::open(&input)?;
            let list = reader.read_list()?;
            let tof_range = list.tof_min().zip(list.tof_max());
            let pulse_range = list
                .pulse_time_min()
                .ok()
                .flatten()
                .zip(list.pulse_time_max().ok().flatten());

            if json {
                let summary = serde_json::json!({
                    "file": input.display().to_string(),
                    "size_bytes": reader.file_size(),
                    "event_type": list.event_type().name(),
                    "events": list.number_events(),
                    "detector_ids": list.detector_ids().iter().copied().collect::<Vec<_>>(),
                    "bin_edges": list.data_x().len(),
                    "tof_range": tof_range.map(|(lo, hi)| [lo, hi]),
                    "pulse_time_range": pulse_range.map(|(lo, hi)| [lo.0, hi.0]),
                    "memory_bytes": list.memory_size(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("File: {}", input.display());
                println!(
                    "Size: {} bytes ({:.2} MB)",
                    reader.file_size(),
                    reader.file_size() as f64 / 1_000_000.0
                );
                println!("Event type: {}", list.event_type());
                println!("Events: {}", list.number_events());
                println!("Detector IDs: {}", list.detector_ids().len());
                println!("Bin edges: {}", list.data_x().len());
                if let Some((lo, hi)) = tof_range {
                    println!("TOF range: {} - {}", lo, hi);
                }
                if let Some((lo, hi)) = pulse_range {
                    println!("Pulse time range: {} - {} ns", lo.0, hi.0);
                }
                println!("Memory estimate: {} bytes", list.memory_size());
            }
        }

        Commands::Histogram {
            input,
            min,
            max,
            bins,
            output,
            skip_errors,
        } => {
            let list = read_list(&input)?;
            let edges = BinEdges::uniform(min, max, bins)?;
            let start = Instant::now();
            let histogram = list.generate_histogram(edges.as_slice(), skip_errors)?;
            debug!(
                "histogrammed {} events into {} bins in {:.2?}",
                list.number_events(),
                bins,
                start.elapsed()
            );

            if let Some(path) = output {
                let mut writer = EventFileWriter::create(&path)?;
                writer.write_histogram_csv(edges.as_slice(), &histogram)?;
                println!("Wrote {} bins to {}", histogram.len(), path.display());
            } else {
                let x = edges.as_slice();
                for (i, count) in histogram.counts.iter().enumerate() {
                    match histogram.errors.get(i) {
                        Some(error) => println!("{}\t{}\t{}\t{}", x[i], x[i + 1], count, error),
                        None => println!("{}\t{}\t{}", x[i], x[i + 1], count),
                    }
                }
            }
            println!("Total: {}", histogram.total());
        }

        Commands::Compress {
            input,
            output,
            tolerance,
        } => {
            let source = read_list(&input)?;
            let mut compressed = EventList::new();
            source.compress_into(tolerance, &mut compressed)?;
            write_list(&output, &compressed)?;
            println!(
                "Compressed {} events into {}",
                source.number_events(),
                compressed.number_events()
            );
        }

        Commands::Filter {
            input,
            output,
            start,
            stop,
        } => {
            let source = read_list(&input)?;
            let mut filtered = EventList::new();
            source.filter_by_pulse_time(
                PulseTime::from_nanoseconds(start),
                PulseTime::from_nanoseconds(stop),
                &mut filtered,
            )?;
            write_list(&output, &filtered)?;
            println!(
                "Kept {} of {} events",
                filtered.number_events(),
                source.number_events()
            );
        }

        Commands::Mask {
            input,
            output,
            min,
            max,
        } => {
            let mut list = read_list(&input)?;
            let removed = list.mask_tof(min, max)?;
            write_list(&output, &list)?;
            println!(
                "Removed {} events, {} remain",
                removed,
                list.number_events()
            );
        }

        Commands::Import { input, output } => {
            let list = EventListSnapshot::read_json(&input)?.into_event_list()?;
            write_list(&output, &list)?;
            info!("imported {} into {}", input.display(), output.display());
            println!("Imported {} {} events", list.number_events(), list.event_type());
        }

        Commands::Export { input, output } => {
            let list = read_list(&input)?;
            EventListSnapshot::from(&list).write_json(&output)?;
            info!("exported {} to {}", input.display(), output.display());
            println!("Exported {} {} events", list.number_events(), list.event_type());
        }

        Commands::SortBenchmark {
            input,
            iterations,
            threads,
        } => {
            if let Some(threads) = threads {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()?;
            }
            let list = read_list(&input)?;
            let events = list.events();
            let selected = SortConfig::default()
                .select(events.len(), list.event_type().event_size());

            println!(
                "Benchmarking with {} {} events, {} iterations, {} threads",
                events.len(),
                list.event_type(),
                iterations,
                rayon::current_num_threads()
            );
            println!("Default configuration selects: {:?}", selected);
            println!(
                "{:<10} | {:<15} | {:<15} | {:<15}",
                "Strategy", "Mean Time (ms)", "Min Time (ms)", "Max Time (ms)"
            );
            println!("{:-<65}", "");

            let rows = match &*events {
                Events::Tof(v) => benchmark_strategies(v, iterations)?,
                Events::Weighted(v) => benchmark_strategies(v, iterations)?,
                Events::WeightedNoTime(v) => benchmark_strategies(v, iterations)?,
            };
            for (strategy, mean_time, min_time, max_time) in rows {
                println!(
                    "{:<10} | {:<15.2} | {:<15.2} | {:<15.2}",
                    format!("{:?}", strategy),
                    mean_time,
                    min_time,
                    max_time
                );
            }
            println!("All strategies agree on the sorted order");
        }
    }

    Ok(())
}
