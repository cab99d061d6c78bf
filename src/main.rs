mod bench;
mod cli;
mod command;
mod config;
mod error;
mod latency;
mod output;
mod probe;
mod stats;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::BenchmarkConfig;
use crate::probe::DnsperfRunner;

/// Send diagnostics to stderr; RUST_LOG overrides the -v level.
fn init_logging(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	let config = BenchmarkConfig {
		tool: PathBuf::from(&cli.tool),
		base_timeout: Duration::from_secs(cli.timeout),
		doh_margin: Duration::from_secs(cli.doh_margin),
		dot_margin: Duration::from_secs(cli.dot_margin),
		grace: Duration::from_secs(cli.grace),
		settle_delay: Duration::from_millis(cli.settle_ms),
		parallel_endpoints: cli.parallel_endpoints.max(1),
	};

	// Nothing can be measured without the tool
	if probe::locate_tool(&config.tool).is_none() {
		bail!(
			"{} not found. Please install it and ensure it is in PATH.",
			config.tool.display(),
		);
	}

	let servers = config::read_server_file(&cli.servers)?;
	let domains = config::read_domain_file(&cli.domains)?;
	if servers.is_empty() {
		bail!("no valid DNS server configurations in '{}'", cli.servers);
	}
	if domains.is_empty() {
		bail!("no domains to query in '{}'", cli.domains);
	}

	output::print_config_summary(&servers, domains.len(), &config);

	println!("Starting DNS performance test...");
	let runner = Arc::new(DnsperfRunner::new(config.tool.clone(), config.grace));
	let results = bench::run_benchmark(&servers, &domains, &config, runner)
		.await
		.context("benchmark aborted")?;

	output::print_results_table(&results);
	output::print_failure_summary(&results);

	if let Some(path) = &cli.output {
		output::write_csv(path, &results)?;
	}

	println!("\nDNS performance test finished.");
	Ok(())
}
