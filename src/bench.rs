use std::path::Path;
use std::sync::Arc;

use hickory_proto::rr::RecordType;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::command::build_invocation;
use crate::config::{BenchmarkConfig, EndpointDescriptor};
use crate::error::{BenchError, ProbeFailure};
use crate::latency::extract_latency;
use crate::output::print_endpoint_summary;
use crate::probe::ProbeExecutor;
use crate::stats::{fold_endpoint, sort_results, EndpointResult, ProbeFailureRecord, ProbeKind};

/// Run the cold/warm benchmark for every endpoint over every domain.
///
/// Domains are probed in the given order. A failed probe only costs its
/// own sample; the run is aborted only when the tool cannot be launched.
/// Returns results sorted fastest uncached average first.
pub async fn run_benchmark<E: ProbeExecutor + 'static>(
	endpoints: &[EndpointDescriptor],
	domains: &[String],
	config: &BenchmarkConfig,
	executor: Arc<E>,
) -> Result<Vec<EndpointResult>, BenchError> {
	// One query file per endpoint so concurrent endpoints never share one
	let scratch = tempfile::Builder::new()
		.prefix("dnsperf-bench-")
		.tempdir()?;
	let query_file = |i: usize| scratch.path().join(format!("query-{}.txt", i));

	let mut results = if config.parallel_endpoints <= 1 {
		let mut results = Vec::with_capacity(endpoints.len());
		for (i, endpoint) in endpoints.iter().enumerate() {
			results.push(
				bench_endpoint(executor.as_ref(), endpoint, domains, &query_file(i), config).await?,
			);
		}
		results
	} else {
		let semaphore = Arc::new(Semaphore::new(config.parallel_endpoints));
		let domains: Arc<[String]> = domains.into();
		let mut tasks = JoinSet::new();

		for (i, endpoint) in endpoints.iter().enumerate() {
			let sem = semaphore.clone();
			let executor = executor.clone();
			let endpoint = endpoint.clone();
			let domains = domains.clone();
			let config = config.clone();
			let path = query_file(i);

			tasks.spawn(async move {
				let _permit = sem.acquire().await.ok();
				let result = bench_endpoint(
					executor.as_ref(), &endpoint, &domains, &path, &config,
				).await;
				(i, result)
			});
		}

		// Slots keep endpoint order regardless of completion order
		let mut slots: Vec<Option<EndpointResult>> = vec![None; endpoints.len()];
		while let Some(joined) = tasks.join_next().await {
			let (i, result) = joined?;
			slots[i] = Some(result?);
		}
		slots.into_iter().flatten().collect()
	};

	sort_results(&mut results);
	Ok(results)
}

/// Probe every domain against one endpoint and fold the samples.
async fn bench_endpoint<E: ProbeExecutor>(
	executor: &E,
	endpoint: &EndpointDescriptor,
	domains: &[String],
	query_file: &Path,
	config: &BenchmarkConfig,
) -> Result<EndpointResult, BenchError> {
	println!(
		"\n[Testing Server: {} ({} @ {})]",
		endpoint.name, endpoint.transport, endpoint.target(),
	);

	let mut uncached = Vec::new();
	let mut cached = Vec::new();
	let mut failures = Vec::new();
	let total = domains.len();

	for (i, domain) in domains.iter().enumerate() {
		let label = format!("{} ({}/{}) {}", endpoint.name, i + 1, total, domain);

		if let Err(e) = write_query_file(query_file, domain).await {
			let failure = ProbeFailure::QueryFile(e.to_string());
			failures.push(record(&label, domain, ProbeKind::Uncached, &failure));
			continue;
		}

		match probe(executor, endpoint, query_file, config).await {
			Ok(ms) => {
				println!("  {} uncached: OK ({:.2} ms)", label, ms);
				uncached.push(ms);
			}
			Err(failure) => {
				check_fatal(&failure)?;
				failures.push(record(&label, domain, ProbeKind::Uncached, &failure));
				continue;
			}
		}

		// Give the resolver a moment to settle the freshly cached record
		if !config.settle_delay.is_zero() {
			tokio::time::sleep(config.settle_delay).await;
		}

		match probe(executor, endpoint, query_file, config).await {
			Ok(ms) => {
				println!("  {} cached:   OK ({:.2} ms)", label, ms);
				cached.push(ms);
			}
			Err(failure) => {
				check_fatal(&failure)?;
				failures.push(record(&label, domain, ProbeKind::Cached, &failure));
			}
		}
	}

	let result = fold_endpoint(&endpoint.name, endpoint.transport, &uncached, &cached, failures);
	print_endpoint_summary(&result);
	Ok(result)
}

/// Build, execute, and interpret a single probe.
async fn probe<E: ProbeExecutor>(
	executor: &E,
	endpoint: &EndpointDescriptor,
	query_file: &Path,
	config: &BenchmarkConfig,
) -> Result<f64, ProbeFailure> {
	let spec = build_invocation(endpoint, query_file, config)?;
	let raw = executor.execute(&spec).await?;
	extract_latency(&raw).ok_or(ProbeFailure::Unparseable)
}

/// A tool that cannot be started makes every remaining probe pointless.
fn check_fatal(failure: &ProbeFailure) -> Result<(), BenchError> {
	match failure {
		ProbeFailure::Launch { tool, reason } => Err(BenchError::ProcessLaunchFailed {
			tool: tool.clone(),
			reason: reason.clone(),
		}),
		_ => Ok(()),
	}
}

fn record(label: &str, domain: &str, kind: ProbeKind, failure: &ProbeFailure) -> ProbeFailureRecord {
	println!("  {} {}: FAILED ({})", label, kind, failure);
	warn!(domain, %kind, reason = %failure, "probe failed");
	ProbeFailureRecord {
		domain: domain.to_string(),
		kind,
		reason: failure.to_string(),
	}
}

/// Line dnsperf reads from its data file
fn query_line(domain: &str) -> String {
	format!("{} {}\n", domain, RecordType::A)
}

async fn write_query_file(path: &Path, domain: &str) -> std::io::Result<()> {
	tokio::fs::write(path, query_line(domain)).await
}
