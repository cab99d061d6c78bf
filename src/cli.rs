use clap::Parser;

/// DNS latency benchmark driven by dnsperf
#[derive(Parser, Debug)]
#[command(name = "dnsperf-bench")]
#[command(about = "Benchmark cold and warm DNS latency over UDP, DoT, and DoH using dnsperf")]
pub struct Cli {
	/// Server list file (lines of "name, plain|doh|dot, address[, port]")
	#[arg(short = 'f', long = "servers", default_value = "dns_servers.txt")]
	pub servers: String,

	/// Domain list file (one domain per line)
	#[arg(short = 'd', long = "domains", default_value = "domains.txt")]
	pub domains: String,

	/// dnsperf executable name or path
	#[arg(long = "tool", default_value = "dnsperf")]
	pub tool: String,

	/// Base per-query timeout in seconds
	#[arg(short = 't', long = "timeout", default_value = "5")]
	pub timeout: u64,

	/// Extra timeout in seconds for DoH servers
	#[arg(long = "doh-margin", default_value = "7")]
	pub doh_margin: u64,

	/// Extra timeout in seconds for DoT servers
	#[arg(long = "dot-margin", default_value = "5")]
	pub dot_margin: u64,

	/// Seconds allowed on top of the query timeout before dnsperf is killed
	#[arg(long = "grace", default_value = "2")]
	pub grace: u64,

	/// Delay in milliseconds between the uncached and the cached probe
	#[arg(long = "settle-ms", default_value = "50")]
	pub settle_ms: u64,

	/// Number of servers benchmarked at the same time
	#[arg(long = "parallel-endpoints", default_value = "1")]
	pub parallel_endpoints: usize,

	/// Output CSV file path
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,

	/// Increase log verbosity (-v debug, -vv trace)
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	pub verbose: u8,
}
