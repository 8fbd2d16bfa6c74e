//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use wayback_mirror_core::{
    ConfigError, DEFAULT_MAXIMUM_PAGES, DEFAULT_WORKERS, EngineConfig, FailurePolicy,
};

/// Download an entire website from the Wayback Machine.
///
/// Lists every archived capture under SITE, keeps the most recent capture of
/// each file and writes the original bytes into a local directory tree.
#[derive(Parser, Debug)]
#[command(name = "wayback-mirror")]
#[command(author, version, about)]
pub struct Args {
    /// Site to mirror: a bare host or full URL (e.g. http://example.com)
    pub site: String,

    /// Output directory (default: websites/<host>)
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Only captures at or after this timestamp (e.g. 20060716231334)
    #[arg(short = 'f', long = "from")]
    pub from: Option<String>,

    /// Only captures at or before this timestamp (e.g. 20100916231334)
    #[arg(short = 't', long = "to")]
    pub to: Option<String>,

    /// Restrict to URLs matching this regex (case-insensitive)
    #[arg(short = 'o', long)]
    pub only: Option<String>,

    /// Skip URLs matching this regex (case-insensitive)
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Include captures with any HTTP status, not just 200
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Maximum number of wildcard index pages to scan
    #[arg(short = 'p', long, default_value_t = DEFAULT_MAXIMUM_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    pub maximum_pages: u32,

    /// Number of concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Download only the exact URL given, without scanning paths under it
    #[arg(short = 'e', long)]
    pub exact_url: bool,

    /// Keep every distinct capture, each under <directory>/<timestamp>/
    #[arg(short = 's', long)]
    pub all_timestamps: bool,

    /// Stop the whole run on the first failed download
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Print the files that would be downloaded as JSON and exit
    #[arg(long)]
    pub list: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Builds the validated run configuration from the parsed flags.
    pub fn to_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut builder = EngineConfig::builder(&self.site)
            .include_all_statuses(self.all)
            .maximum_pages(self.maximum_pages)
            .workers(usize::from(self.concurrency))
            .exact_url(self.exact_url)
            .all_timestamps(self.all_timestamps);

        if let Some(directory) = &self.directory {
            builder = builder.output_dir(directory);
        }
        if let Some(from) = &self.from {
            builder = builder.from_timestamp(from);
        }
        if let Some(to) = &self.to {
            builder = builder.to_timestamp(to);
        }
        if let Some(only) = &self.only {
            builder = builder.only_filter(only);
        }
        if let Some(exclude) = &self.exclude {
            builder = builder.exclude_filter(exclude);
        }
        if self.fail_fast {
            builder = builder.failure_policy(FailurePolicy::FailFast);
        }
        if let Some(secs) = self.timeout_secs {
            let timeout = Duration::from_secs(secs);
            builder = builder.retrieval_timeout(timeout).index_timeout(timeout);
        }

        builder.build()
    }
}
