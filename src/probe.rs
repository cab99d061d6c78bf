use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::command::InvocationSpec;
use crate::error::ProbeFailure;

/// Raw tool output on success, the reason there is none otherwise
pub type ProbeResult = Result<String, ProbeFailure>;

/// Longest stderr excerpt kept in a failure reason
const STDERR_EXCERPT_CHARS: usize = 240;

/// Runs one probe invocation to completion.
pub trait ProbeExecutor: Send + Sync {
	fn execute(&self, spec: &InvocationSpec) -> impl Future<Output = ProbeResult> + Send;
}

/// Executes dnsperf as a child process
#[derive(Debug, Clone)]
pub struct DnsperfRunner {
	tool: PathBuf,
	grace: Duration,
}

impl DnsperfRunner {
	pub fn new(tool: impl Into<PathBuf>, grace: Duration) -> Self {
		Self { tool: tool.into(), grace }
	}
}

impl ProbeExecutor for DnsperfRunner {
	/// Run the tool with a hard bound of `effective_timeout + grace`.
	///
	/// The child is killed and reaped when the bound expires, and
	/// `kill_on_drop` covers the case where this future is dropped.
	async fn execute(&self, spec: &InvocationSpec) -> ProbeResult {
		let bound = spec.effective_timeout.saturating_add(self.grace);
		debug!(
			"executing: {} {} (timeout: {}s)",
			self.tool.display(), spec.arguments.join(" "),
			spec.effective_timeout.as_secs(),
		);

		let mut child = Command::new(&self.tool)
			.args(&spec.arguments)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| self.launch_failure(e))?;

		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		let outcome = tokio::time::timeout(bound, async {
			let (out, err, status) = tokio::join!(
				read_pipe(stdout), read_pipe(stderr), child.wait()
			);
			status.map(|s| (s, out, err))
		}).await;

		match outcome {
			Ok(Ok((status, out, err))) => {
				let stdout = String::from_utf8_lossy(&out).into_owned();
				if status.success() {
					return Ok(stdout);
				}
				let stderr = String::from_utf8_lossy(&err).into_owned();
				debug!("stderr: {}", or_empty(stderr.trim()));
				debug!("stdout: {}", or_empty(stdout.trim()));
				Err(ProbeFailure::NonZeroExit {
					code: status.code().unwrap_or(-1),
					stderr: stderr_excerpt(&stderr),
				})
			}
			Ok(Err(e)) => Err(ProbeFailure::Wait(e.to_string())),
			Err(_) => {
				if let Err(e) = child.kill().await {
					debug!("failed to kill timed out dnsperf: {}", e);
				}
				debug!("dnsperf timed out after {:?}", bound);
				Err(ProbeFailure::Timeout { after: spec.effective_timeout })
			}
		}
	}
}

impl DnsperfRunner {
	fn launch_failure(&self, e: std::io::Error) -> ProbeFailure {
		ProbeFailure::Launch {
			tool: self.tool.display().to_string(),
			reason: e.to_string(),
		}
	}
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
	let mut buf = Vec::new();
	if let Some(mut pipe) = pipe {
		// A read error just truncates what we captured
		let _ = pipe.read_to_end(&mut buf).await;
	}
	buf
}

fn or_empty(s: &str) -> &str {
	if s.is_empty() { "<empty>" } else { s }
}

/// Single-line, length-limited form of the tool's stderr.
fn stderr_excerpt(stderr: &str) -> String {
	let cleaned = stderr.trim().replace('\n', " ");
	if cleaned.is_empty() {
		return "No stderr output".to_string();
	}
	if cleaned.chars().count() > STDERR_EXCERPT_CHARS {
		let mut cut: String = cleaned.chars().take(STDERR_EXCERPT_CHARS).collect();
		cut.push_str("...");
		cut
	} else {
		cleaned
	}
}

/// Find the tool the way the shell would: a path is checked directly,
/// a bare name is looked up in PATH.
pub fn locate_tool(tool: &Path) -> Option<PathBuf> {
	if tool.components().count() > 1 {
		return tool.is_file().then(|| tool.to_path_buf());
	}
	let path = std::env::var_os("PATH")?;
	std::env::split_paths(&path)
		.map(|dir| dir.join(tool))
		.find(|candidate| candidate.is_file())
}
