use once_cell::sync::Lazy;
use regex::Regex;

/// dnsperf 2.14+: "Average Latency (s):  0.00818"
static LATENCY_SECONDS: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"Average Latency\s*\(s\):\s+([\d.]+)").expect("valid latency regex")
});

/// Older builds: "Average latency:  8.18 ms"
static LATENCY_MILLIS: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?i)Average latency:\s+([\d.]+)\s*ms").expect("valid latency regex")
});

/// Extract the average latency in milliseconds from dnsperf output.
///
/// The seconds field is preferred over the milliseconds field. Returns
/// None when neither is present or the value is exactly zero, which only
/// happens when the tool measured nothing.
pub fn extract_latency(output: &str) -> Option<f64> {
	if let Some(caps) = LATENCY_SECONDS.captures(output) {
		let seconds: f64 = caps[1].parse().ok()?;
		return non_zero(seconds * 1000.0);
	}
	if let Some(caps) = LATENCY_MILLIS.captures(output) {
		let millis: f64 = caps[1].parse().ok()?;
		return non_zero(millis);
	}
	None
}

fn non_zero(latency_ms: f64) -> Option<f64> {
	if latency_ms == 0.0 {
		None
	} else {
		Some(latency_ms)
	}
}
