use std::time::Duration;

use thiserror::Error;

/// A server list line that cannot be turned into an endpoint descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("malformed server line (expected 'name, type, address[, port]'): {0}")]
	TooFewFields(String),

	#[error("server line has an empty name: {0}")]
	EmptyName(String),

	#[error("server '{0}' has an empty address")]
	EmptyAddress(String),

	#[error("server '{name}': unknown type '{kind}'")]
	UnknownTransport { name: String, kind: String },

	#[error("server '{name}': invalid port '{port}'")]
	InvalidPort { name: String, port: String },
}

/// Failure to turn a descriptor into a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	#[error("invalid DoH URI '{uri}': {reason}")]
	InvalidUri { uri: String, reason: String },

	#[error("DoH URI '{0}' has no host to use for SNI")]
	MissingSniHost(String),
}

/// Why a single probe produced no latency sample.
///
/// Each variant renders as the human-readable reason attached to the
/// endpoint/domain/probe it occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
	#[error("command build failed: {0}")]
	Build(#[from] BuildError),

	#[error("failed to launch '{tool}': {reason}")]
	Launch { tool: String, reason: String },

	#[error("lost track of running dnsperf: {0}")]
	Wait(String),

	#[error("dnsperf timed out (after {}s)", .after.as_secs())]
	Timeout { after: Duration },

	#[error("dnsperf error (code {code}): {stderr}")]
	NonZeroExit { code: i32, stderr: String },

	#[error("could not interpret dnsperf output")]
	Unparseable,

	#[error("could not write query file: {0}")]
	QueryFile(String),
}

/// Errors that abort the whole benchmark run
#[derive(Debug, Error)]
pub enum BenchError {
	#[error("cannot run '{tool}': {reason}")]
	ProcessLaunchFailed { tool: String, reason: String },

	#[error("failed to prepare scratch directory: {0}")]
	Scratch(#[from] std::io::Error),

	#[error("benchmark task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}
