use std::cmp::Ordering;
use std::fmt;

use crate::config::Transport;

/// Which half of a cold/warm probe pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
	Uncached,
	Cached,
}

impl fmt::Display for ProbeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProbeKind::Uncached => f.write_str("uncached"),
			ProbeKind::Cached => f.write_str("cached"),
		}
	}
}

/// A probe that produced no sample, with the reason why
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeFailureRecord {
	pub domain: String,
	pub kind: ProbeKind,
	pub reason: String,
}

/// Final per-endpoint result handed to the report
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResult {
	pub name: String,
	pub transport: Transport,
	pub avg_uncached: Option<f64>,
	/// Only set when at least one uncached probe also succeeded
	pub avg_cached: Option<f64>,
	pub uncached_stddev: Option<f64>,
	pub cached_stddev: Option<f64>,
	pub uncached_samples: usize,
	pub cached_samples: usize,
	pub failures: Vec<ProbeFailureRecord>,
}

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: f64 = values.iter().sum();
	Some(sum / values.len() as f64)
}

/// Calculate the population standard deviation of a slice of values.
pub fn stddev(values: &[f64]) -> Option<f64> {
	let avg = mean(values)?;
	let variance = values.iter()
		.map(|v| (v - avg).powi(2))
		.sum::<f64>() / values.len() as f64;
	Some(variance.sqrt())
}

/// Fold the samples gathered for one endpoint into its final result.
///
/// Cached figures are dropped when there is no uncached baseline.
pub fn fold_endpoint(
	name: &str,
	transport: Transport,
	uncached: &[f64],
	cached: &[f64],
	failures: Vec<ProbeFailureRecord>,
) -> EndpointResult {
	let cached: &[f64] = if uncached.is_empty() { &[] } else { cached };

	EndpointResult {
		name: name.to_string(),
		transport,
		avg_uncached: mean(uncached),
		avg_cached: mean(cached),
		uncached_stddev: stddev(uncached),
		cached_stddev: stddev(cached),
		uncached_samples: uncached.len(),
		cached_samples: cached.len(),
		failures,
	}
}

/// Order results for reporting: fastest uncached average first,
/// endpoints without one last. The sort is stable.
pub fn sort_results(results: &mut [EndpointResult]) {
	results.sort_by(|a, b| match (a.avg_uncached, b.avg_uncached) {
		(Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});
}
