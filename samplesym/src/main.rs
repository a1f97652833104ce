//! # samplesym - Main Entry Point
//!
//! Loads decoded trace records (and optionally on-device symbol tables),
//! symbolizes every sample, and prints one block per sample to stdout.
//! Summaries go to stderr unless `--quiet`; diagnostics follow `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::io::{self, BufWriter};
use std::time::Instant;

use samplesym::cli::Args;
use samplesym::profiling::symbolize_trace;
use samplesym::symbolization::{NoOnDeviceSymbols, ResolverContext};
use samplesym::trace_data::{load_events, load_on_device_symbols, write_samples};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DATAERR: i32 = 65;
const EXIT_NOINPUT: i32 = 66;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::NotFound {
                return EXIT_NOINPUT;
            }
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return EXIT_DATAERR;
        }
    }
    EXIT_ERROR
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.resolver_config();
    debug!("{config:?}");

    let started = Instant::now();
    let events = load_events(&args.events)?;
    info!("Loaded {} records from {}", events.len(), args.events.display());

    let ctx = ResolverContext::with_host_tools(&config);
    info!("Host strategies: {}", ctx.strategy_names().join(", "));

    let samples = match args.symbols {
        Some(ref path) => {
            let symbols = load_on_device_symbols(path)?;
            info!("Loaded on-device tables for {} modules", symbols.module_count());
            symbolize_trace(&events, &symbols, &ctx, &config)
        }
        None => symbolize_trace(&events, &NoOnDeviceSymbols, &ctx, &config),
    };

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_samples(&mut writer, &samples)?;

    let stats = ctx.stats().snapshot();
    info!("{stats:?}");
    if !args.quiet {
        eprintln!(
            "Symbolized {} samples in {:.2?}: {} host lookups ({} cached, {} skipped), \
             {} on-device hits, {} unresolved, {} unmapped",
            samples.len(),
            started.elapsed(),
            stats.strategy_invocations,
            stats.cache_hits,
            stats.skipped,
            stats.on_device_hits,
            stats.degraded,
            stats.unmapped,
        );
    }
    Ok(())
}
