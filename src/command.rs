use std::path::Path;
use std::time::Duration;

use url::{Host, Url};

use crate::config::{BenchmarkConfig, EndpointDescriptor, Transport};
use crate::error::BuildError;

/// Client count, outstanding queries and query rate for every probe.
/// A sample is one serialized round trip, never an averaged burst.
const QUERIES_PER_RUN: u32 = 1;

/// Arguments for one dnsperf run plus the timeout handed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
	pub arguments: Vec<String>,
	pub effective_timeout: Duration,
}

#[cfg(test)]
impl InvocationSpec {
	/// Value following `flag`, if the flag is present.
	pub fn flag_value(&self, flag: &str) -> Option<&str> {
		self.arguments.iter()
			.position(|a| a == flag)
			.and_then(|i| self.arguments.get(i + 1))
			.map(String::as_str)
	}
}

/// Build the dnsperf invocation for one probe of `endpoint`.
///
/// `query_file` must hold exactly one `<domain> A` line. DoH endpoints
/// need a URI with a host component; it becomes the TLS server name.
pub fn build_invocation(
	endpoint: &EndpointDescriptor,
	query_file: &Path,
	config: &BenchmarkConfig,
) -> Result<InvocationSpec, BuildError> {
	let mut args: Vec<String> = Vec::new();

	let effective_timeout = match endpoint.transport {
		Transport::Plain => {
			push_target(&mut args, &endpoint.address, endpoint.port);
			config.base_timeout
		}
		Transport::Dot => {
			push_target(&mut args, &endpoint.address, endpoint.port);
			args.extend(["-m".to_string(), "dot".to_string()]);
			config.base_timeout.saturating_add(config.dot_margin)
		}
		Transport::Doh => {
			let uri = Url::parse(&endpoint.address).map_err(|e| BuildError::InvalidUri {
				uri: endpoint.address.clone(),
				reason: e.to_string(),
			})?;
			// IPv6 literals go to dnsperf without their URI brackets
			let sni = match uri.host() {
				Some(Host::Domain(host)) if !host.is_empty() => host.to_string(),
				Some(Host::Ipv4(addr)) => addr.to_string(),
				Some(Host::Ipv6(addr)) => addr.to_string(),
				_ => return Err(BuildError::MissingSniHost(endpoint.address.clone())),
			};
			// dnsperf assumes 443, so only https may leave its default port implicit
			let uri_port = if uri.scheme() == "https" {
				uri.port()
			} else {
				uri.port_or_known_default()
			};
			args.extend(["-m".to_string(), "doh".to_string()]);
			args.extend(["-O".to_string(), format!("doh-uri={}", endpoint.address)]);
			// Descriptor port wins, then a port written in the URI, else the tool's default
			push_target(&mut args, &sni, endpoint.port.or(uri_port));
			config.base_timeout.saturating_add(config.doh_margin)
		}
	};

	args.extend([
		"-d".to_string(), query_file.display().to_string(),
		"-c".to_string(), QUERIES_PER_RUN.to_string(),
		"-q".to_string(), QUERIES_PER_RUN.to_string(),
		"-Q".to_string(), QUERIES_PER_RUN.to_string(),
		"-t".to_string(), effective_timeout.as_secs().to_string(),
	]);

	Ok(InvocationSpec {
		arguments: args,
		effective_timeout,
	})
}

fn push_target(args: &mut Vec<String>, server: &str, port: Option<u16>) {
	args.extend(["-s".to_string(), server.to_string()]);
	if let Some(port) = port {
		args.extend(["-p".to_string(), port.to_string()]);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn endpoint(transport: Transport, address: &str, port: Option<u16>) -> EndpointDescriptor {
		EndpointDescriptor {
			name: "test".to_string(),
			transport,
			address: address.to_string(),
			port,
		}
	}

	fn build(e: &EndpointDescriptor) -> Result<InvocationSpec, BuildError> {
		build_invocation(e, Path::new("/tmp/query.txt"), &BenchmarkConfig::default())
	}

	#[test]
	fn test_plain_without_port() {
		let spec = build(&endpoint(Transport::Plain, "8.8.8.8", None)).unwrap();
		assert_eq!(spec.flag_value("-s"), Some("8.8.8.8"));
		assert_eq!(spec.flag_value("-p"), None);
		assert_eq!(spec.flag_value("-m"), None);
		assert_eq!(spec.effective_timeout, Duration::from_secs(5));
		assert_eq!(spec.flag_value("-t"), Some("5"));
	}

	#[test]
	fn test_plain_with_port() {
		let spec = build(&endpoint(Transport::Plain, "127.0.0.1", Some(5353))).unwrap();
		assert_eq!(spec.flag_value("-p"), Some("5353"));
	}

	#[test]
	fn test_dot_adds_mode_and_margin() {
		let spec = build(&endpoint(Transport::Dot, "dns.quad9.net", Some(853))).unwrap();
		assert_eq!(spec.flag_value("-s"), Some("dns.quad9.net"));
		assert_eq!(spec.flag_value("-m"), Some("dot"));
		assert_eq!(spec.flag_value("-p"), Some("853"));
		assert_eq!(spec.effective_timeout, Duration::from_secs(10));
	}

	#[test]
	fn test_doh_default_port_and_sni() {
		let spec = build(&endpoint(Transport::Doh, "https://dns.example.org/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-m"), Some("doh"));
		assert_eq!(spec.flag_value("-O"), Some("doh-uri=https://dns.example.org/dns-query"));
		assert_eq!(spec.flag_value("-s"), Some("dns.example.org"));
		assert_eq!(spec.flag_value("-p"), None);
		assert_eq!(spec.effective_timeout, Duration::from_secs(12));
	}

	#[test]
	fn test_doh_explicit_port() {
		let spec = build(&endpoint(Transport::Doh, "https://dns.example.org/dns-query", Some(8443))).unwrap();
		assert_eq!(spec.flag_value("-p"), Some("8443"));
	}

	#[test]
	fn test_doh_port_from_uri() {
		let spec = build(&endpoint(Transport::Doh, "https://dns.example.org:4443/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-p"), Some("4443"));
		let spec = build(&endpoint(Transport::Doh, "https://dns.example.org:4443/dns-query", Some(8443))).unwrap();
		assert_eq!(spec.flag_value("-p"), Some("8443"));
	}

	#[test]
	fn test_doh_malformed_uri() {
		let r = build(&endpoint(Transport::Doh, "dns.example.org/dns-query", None));
		assert!(matches!(r, Err(BuildError::InvalidUri { .. })));
		let r = build(&endpoint(Transport::Doh, "mailto:ops@example.org", None));
		assert!(matches!(r, Err(BuildError::MissingSniHost(_))));
	}

	#[test]
	fn test_doh_ipv6_literal_sni() {
		let spec = build(&endpoint(Transport::Doh, "https://[2606:4700::1111]/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-s"), Some("2606:4700::1111"));
		assert_eq!(spec.flag_value("-O"), Some("doh-uri=https://[2606:4700::1111]/dns-query"));
		assert_eq!(spec.flag_value("-p"), None);
	}

	#[test]
	fn test_doh_plain_http_keeps_port_80() {
		let spec = build(&endpoint(Transport::Doh, "http://doh.local:80/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-s"), Some("doh.local"));
		assert_eq!(spec.flag_value("-p"), Some("80"));
		let spec = build(&endpoint(Transport::Doh, "http://doh.local/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-p"), Some("80"));
		let spec = build(&endpoint(Transport::Doh, "https://doh.local:443/dns-query", None)).unwrap();
		assert_eq!(spec.flag_value("-p"), None);
	}

	#[test]
	fn test_huge_timeouts_saturate() {
		let config = BenchmarkConfig {
			base_timeout: Duration::MAX,
			doh_margin: Duration::from_secs(7),
			dot_margin: Duration::from_secs(5),
			..BenchmarkConfig::default()
		};
		for transport in [Transport::Dot, Transport::Doh] {
			let e = endpoint(transport, "https://dns.example.org/dns-query", None);
			let spec = build_invocation(&e, Path::new("q.txt"), &config).unwrap();
			assert_eq!(spec.effective_timeout, Duration::MAX);
		}
	}

	#[test]
	fn test_common_flags() {
		let spec = build(&endpoint(Transport::Plain, "9.9.9.9", None)).unwrap();
		assert_eq!(spec.flag_value("-d"), Some("/tmp/query.txt"));
		assert_eq!(spec.flag_value("-c"), Some("1"));
		assert_eq!(spec.flag_value("-q"), Some("1"));
		assert_eq!(spec.flag_value("-Q"), Some("1"));
	}

	#[test]
	fn test_injected_timeouts() {
		let config = BenchmarkConfig {
			base_timeout: Duration::from_secs(1),
			doh_margin: Duration::from_secs(3),
			..BenchmarkConfig::default()
		};
		let e = endpoint(Transport::Doh, "https://dns.example.org/dns-query", None);
		let spec = build_invocation(&e, Path::new("q.txt"), &config).unwrap();
		assert_eq!(spec.flag_value("-t"), Some("4"));
	}

	#[test]
	fn test_build_is_pure() {
		let e = endpoint(Transport::Doh, "https://dns.example.org/dns-query", Some(443));
		assert_eq!(build(&e), build(&e));
	}
}
