//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::ResolverConfig;

#[derive(Parser, Debug)]
#[command(
    name = "samplesym",
    about = "Symbolize recorded profiling samples",
    after_help = "\
EXAMPLES:
    samplesym events.json                              Host files only
    samplesym events.json --symbols device_syms.json   Prefer on-device tables
    samplesym events.json --symfs ./symbols --jobs 8   Mirror dir, parallel lookups"
)]
pub struct Args {
    /// Decoded trace records (JSON array)
    #[arg(value_name = "EVENTS")]
    pub events: PathBuf,

    /// On-device symbol tables (JSON object keyed by module)
    #[arg(long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Host directory mirroring device paths
    #[arg(long, value_name = "DIR")]
    pub symfs: Option<PathBuf>,

    /// Drop leading kernel frames from every sample
    #[arg(long)]
    pub skip_kernel: bool,

    /// Threads for host lookups (1 = sequential)
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Keep mangled symbol names
    #[arg(long)]
    pub no_demangle: bool,

    /// Suppress the summary on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            symfs: self.symfs.clone(),
            demangle: !self.no_demangle,
            skip_kernel: self.skip_kernel,
            workers: self.jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["samplesym", "events.json"]).expect("parse");
        let config = args.resolver_config();
        assert_eq!(args.events, PathBuf::from("events.json"));
        assert!(config.demangle);
        assert!(!config.skip_kernel);
        assert!(!config.uses_prefetch());
        assert_eq!(config.symfs, None);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "samplesym",
            "events.json",
            "--symbols",
            "syms.json",
            "--symfs",
            "/tmp/symfs",
            "--skip-kernel",
            "--jobs",
            "4",
            "--no-demangle",
            "-q",
        ])
        .expect("parse");
        let config = args.resolver_config();
        assert_eq!(args.symbols, Some(PathBuf::from("syms.json")));
        assert!(args.quiet);
        assert!(config.skip_kernel);
        assert!(!config.demangle);
        assert_eq!(config.workers, 4);
        assert_eq!(config.symfs, Some(PathBuf::from("/tmp/symfs")));
    }

    #[test]
    fn test_events_required() {
        assert!(Args::try_parse_from(["samplesym"]).is_err());
    }
}
