//! Runtime client — start/stop/kill/blocking-wait against the container
//! runtime, addressed by instance identifier.
//!
//! [`ContainerCli`] is the production implementation: one short-lived
//! subprocess per operation against a docker-compatible CLI. `wait` is the
//! exception — it blocks until the addressed instance terminates and
//! reports the instance's own exit status.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

/// The narrow command interface the arbiter drives.
///
/// Implementations must not retry or reinterpret operations; the arbiter's
/// state handling assumes one runtime invocation per call.
pub trait RuntimeClient {
    /// Start the instance addressed by `id`.
    fn start(&self, id: &str) -> impl Future<Output = RuntimeResult<()>>;

    /// Stop the instance addressed by `id`, optionally bounding the
    /// runtime's grace period.
    fn stop(&self, id: &str, timeout: Option<Duration>) -> impl Future<Output = RuntimeResult<()>>;

    /// Kill the instance addressed by `id`.
    fn kill(&self, id: &str) -> impl Future<Output = RuntimeResult<()>>;

    /// Block until the instance addressed by `id` terminates; returns its
    /// exit status. Under normal operation this does not return while the
    /// instance is running.
    fn wait(&self, id: &str) -> impl Future<Output = RuntimeResult<i32>>;

    /// Look up the image version backing the instance addressed by `id`.
    fn image_version(&self, id: &str) -> impl Future<Output = RuntimeResult<String>>;
}

/// Production runtime client shelling out to a container CLI.
#[derive(Clone)]
pub struct ContainerCli {
    bin: String,
}

impl ContainerCli {
    /// Create a client for the given runtime binary (e.g. `docker`).
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Run one runtime command, returning its stdout on success.
    async fn run(&self, args: &[&str]) -> RuntimeResult<String> {
        debug!(bin = %self.bin, ?args, "invoking runtime");
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::CommandFailed {
                command: command_line(&self.bin, args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RuntimeClient for ContainerCli {
    async fn start(&self, id: &str) -> RuntimeResult<()> {
        self.run(&["start", id]).await.map(|_| ())
    }

    async fn stop(&self, id: &str, timeout: Option<Duration>) -> RuntimeResult<()> {
        match timeout {
            Some(timeout) => {
                let secs = timeout.as_secs().to_string();
                self.run(&["stop", "--time", &secs, id]).await.map(|_| ())
            }
            None => self.run(&["stop", id]).await.map(|_| ()),
        }
    }

    async fn kill(&self, id: &str) -> RuntimeResult<()> {
        self.run(&["kill", id]).await.map(|_| ())
    }

    async fn wait(&self, id: &str) -> RuntimeResult<i32> {
        // `wait` blocks until the instance exits and prints its exit code.
        let stdout = self.run(&["wait", id]).await?;
        parse_exit_code(&stdout).ok_or_else(|| RuntimeError::UnparseableOutput {
            command: command_line(&self.bin, &["wait", id]),
            output: stdout.trim().to_string(),
        })
    }

    async fn image_version(&self, id: &str) -> RuntimeResult<String> {
        let stdout = self
            .run(&["inspect", "--format", "{{.Config.Image}}", id])
            .await?;
        Ok(stdout.trim().to_string())
    }
}

/// Parse the exit code `wait` prints on its single output line.
fn parse_exit_code(stdout: &str) -> Option<i32> {
    stdout.trim().parse::<i32>().ok()
}

fn command_line(bin: &str, args: &[&str]) -> String {
    let mut line = bin.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
