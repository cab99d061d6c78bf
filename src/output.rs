use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use anyhow::Result;

use crate::config::{BenchmarkConfig, EndpointDescriptor};
use crate::stats::EndpointResult;

/// Print a summary of the benchmark configuration before running.
pub fn print_config_summary(
	servers: &[EndpointDescriptor],
	domain_count: usize,
	config: &BenchmarkConfig,
) {
	println!("DNS Benchmark Configuration");
	println!("===========================");
	println!("Servers:        {}", servers.len());
	for s in servers {
		println!("  - {} ({} @ {})", s.name, s.transport, s.target());
	}
	println!("Domains:        {}", domain_count);
	println!("Tool:           {}", config.tool.display());
	println!("Timeout:        {} s (DoT +{} s, DoH +{} s)",
		config.base_timeout.as_secs(),
		config.dot_margin.as_secs(),
		config.doh_margin.as_secs(),
	);
	println!("Settle delay:   {} ms", config.settle_delay.as_millis());
	if config.parallel_endpoints > 1 {
		println!("Parallel:       {} servers", config.parallel_endpoints);
	}
	println!();
}

/// Print the averages for one endpoint once its domain loop is done.
pub fn print_endpoint_summary(result: &EndpointResult) {
	match result.avg_uncached {
		Some(avg) => println!(
			"  Average Uncached Latency: {:.2} ms ({} queries)",
			avg, result.uncached_samples,
		),
		None => println!("  No successful uncached queries for {}.", result.name),
	}
	match result.avg_cached {
		Some(avg) => println!(
			"  Average Cached Latency: {:.2} ms ({} queries)",
			avg, result.cached_samples,
		),
		None if result.avg_uncached.is_some() => {
			println!("  No successful cached queries for {}.", result.name);
		}
		None => {}
	}
}

fn format_ms(value: Option<f64>) -> String {
	value.map(|v| format!("{:.2} ms", v)).unwrap_or_else(|| "-".to_string())
}

/// Print the benchmark results as a formatted table.
///
/// Results are expected in report order; rank follows that order.
pub fn print_results_table(results: &[EndpointResult]) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Rank", "Server", "Type",
		"Uncached avg", "Cached avg",
		"Uncached n", "Cached n", "Failures",
	]);

	for (i, r) in results.iter().enumerate() {
		table.add_row(vec![
			format!("{}", i + 1),
			r.name.clone(),
			r.transport.to_string(),
			format_ms(r.avg_uncached),
			format_ms(r.avg_cached),
			r.uncached_samples.to_string(),
			r.cached_samples.to_string(),
			r.failures.len().to_string(),
		]);
	}

	println!("\nBenchmark Results (lower is better)");
	println!("===================================\n");
	println!("{table}");
}

/// Print every failed probe, grouped by server.
pub fn print_failure_summary(results: &[EndpointResult]) {
	let total: usize = results.iter().map(|r| r.failures.len()).sum();
	if total == 0 {
		return;
	}
	println!("\nFailed probes: {}", total);
	for r in results.iter().filter(|r| !r.failures.is_empty()) {
		println!("  {}:", r.name);
		for f in &r.failures {
			println!("    {} [{}]: {}", f.domain, f.kind, f.reason);
		}
	}
}

/// Write benchmark results to a CSV file.
///
/// Absent averages are written as empty cells.
pub fn write_csv(path: &str, results: &[EndpointResult]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record([
		"rank", "server", "type",
		"uncached_avg_ms", "uncached_stddev_ms", "uncached_samples",
		"cached_avg_ms", "cached_stddev_ms", "cached_samples",
		"failures",
	])?;

	let cell = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_default();
	for (i, r) in results.iter().enumerate() {
		writer.write_record([
			(i + 1).to_string(),
			r.name.clone(),
			r.transport.to_string(),
			cell(r.avg_uncached),
			cell(r.uncached_stddev),
			r.uncached_samples.to_string(),
			cell(r.avg_cached),
			cell(r.cached_stddev),
			r.cached_samples.to_string(),
			r.failures.len().to_string(),
		])?;
	}

	writer.flush()?;
	println!("\nResults written to: {}", path);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Transport;
	use crate::stats::fold_endpoint;

	#[test]
	fn test_format_ms() {
		assert_eq!(format_ms(Some(8.184)), "8.18 ms");
		assert_eq!(format_ms(None), "-");
	}

	#[test]
	fn test_write_csv() {
		let results = vec![
			fold_endpoint("Local", Transport::Plain, &[5.0, 6.0, 7.0], &[1.0], Vec::new()),
			fold_endpoint("Broken", Transport::Doh, &[], &[], Vec::new()),
		];
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("results.csv");
		write_csv(path.to_str().unwrap(), &results).unwrap();

		let content = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 3);
		assert!(lines[0].starts_with("rank,server,type,uncached_avg_ms"));
		assert_eq!(lines[1], "1,Local,plain,6.00,0.82,3,1.00,0.00,1,0");
		assert_eq!(lines[2], "2,Broken,doh,,,0,,,0,0");
	}
}
