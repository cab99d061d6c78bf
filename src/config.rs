use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use hickory_proto::rr::Name;
use tracing::warn;

use crate::error::ConfigError;

/// Wire transport used to reach an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
	Plain,
	Doh,
	Dot,
}

impl Transport {
	pub fn as_str(&self) -> &'static str {
		match self {
			Transport::Plain => "plain",
			Transport::Doh => "doh",
			Transport::Dot => "dot",
		}
	}
}

impl fmt::Display for Transport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Transport {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"plain" => Ok(Transport::Plain),
			"doh" => Ok(Transport::Doh),
			"dot" => Ok(Transport::Dot),
			other => Err(other.to_string()),
		}
	}
}

/// One configured DNS endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
	pub name: String,
	pub transport: Transport,
	/// Host for plain/DoT, full URI for DoH
	pub address: String,
	pub port: Option<u16>,
}

impl EndpointDescriptor {
	/// Address with the explicit port appended, for display.
	pub fn target(&self) -> String {
		match self.port {
			Some(port) => format!("{}:{}", self.address, port),
			None => self.address.clone(),
		}
	}
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
	/// Path or name of the dnsperf executable
	pub tool: PathBuf,
	/// Per-query timeout handed to the tool before transport padding
	pub base_timeout: Duration,
	pub doh_margin: Duration,
	pub dot_margin: Duration,
	/// Extra wall-clock allowance on top of the tool timeout for process start/teardown
	pub grace: Duration,
	/// Pause between the uncached probe and the cached probe of one domain
	pub settle_delay: Duration,
	/// Number of endpoints benchmarked at the same time
	pub parallel_endpoints: usize,
}

impl Default for BenchmarkConfig {
	fn default() -> Self {
		Self {
			tool: PathBuf::from("dnsperf"),
			base_timeout: Duration::from_secs(5),
			doh_margin: Duration::from_secs(7),
			dot_margin: Duration::from_secs(5),
			grace: Duration::from_secs(2),
			settle_delay: Duration::from_millis(50),
			parallel_endpoints: 1,
		}
	}
}

/// Parse one server list line: `name, type, address[, port]`.
///
/// The type is case-insensitive and every field is trimmed. An empty
/// fourth field means no explicit port.
pub fn parse_server_line(line: &str) -> std::result::Result<EndpointDescriptor, ConfigError> {
	let parts: Vec<&str> = line.split(',').map(str::trim).collect();
	if parts.len() < 3 {
		return Err(ConfigError::TooFewFields(line.trim().to_string()));
	}
	let name = parts[0].to_string();
	if name.is_empty() {
		return Err(ConfigError::EmptyName(line.trim().to_string()));
	}

	if parts[2].is_empty() {
		return Err(ConfigError::EmptyAddress(name));
	}

	let transport = parts[1].parse::<Transport>()
		.map_err(|kind| ConfigError::UnknownTransport { name: name.clone(), kind })?;

	let port = match parts.get(3) {
		Some(raw) if !raw.is_empty() => Some(raw.parse::<u16>()
			.map_err(|_| ConfigError::InvalidPort { name: name.clone(), port: raw.to_string() })?),
		_ => None,
	};

	Ok(EndpointDescriptor {
		name,
		transport,
		address: parts[2].to_string(),
		port,
	})
}

/// Return the non-empty, non-comment lines of a config file.
fn read_config_lines(path: &str, what: &str) -> Result<Vec<String>> {
	let content = std::fs::read_to_string(path)
		.map_err(|e| anyhow!("failed to read {} file '{}': {}", what, path, e))?;
	Ok(content.lines()
		.map(|line| line.trim().to_string())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.collect())
}

/// Read endpoint descriptors from a server list file.
///
/// Malformed lines are skipped with a warning; only an unreadable file is an error.
pub fn read_server_file(path: &str) -> Result<Vec<EndpointDescriptor>> {
	let mut servers = Vec::new();
	for line in read_config_lines(path, "server")? {
		match parse_server_line(&line) {
			Ok(server) => servers.push(server),
			Err(e) => warn!("skipping server line: {}", e),
		}
	}
	Ok(servers)
}

/// Read domains from a file, one per line.
///
/// Blank lines and lines starting with '#' are skipped, as are names
/// that are not valid DNS names.
pub fn read_domain_file(path: &str) -> Result<Vec<String>> {
	let mut domains = Vec::new();
	for line in read_config_lines(path, "domain")? {
		match Name::from_ascii(&line) {
			Ok(_) => domains.push(line),
			Err(e) => warn!("skipping domain '{}': {}", line, e),
		}
	}
	Ok(domains)
}
