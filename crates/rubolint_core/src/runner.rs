//! Process execution with timeouts and per-file supersession.
//!
//! Editors ask for a lint on every change, so several runs for the same file
//! can overlap. Each run may carry a cancellation key. Starting a run for a
//! key supersedes the previous run with that key: the old child is killed
//! and the old call resolves to `None`, so a stale result never reaches the
//! host.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::LinterError;
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::host::{Notification, Notifier};

const LINTER_TIMEOUT_MSG: &str = "Linter-Rubocop: Linter timed out";
const LINTER_TIMEOUT_DESC: &str = "Make sure you are not running Rubocop with a slow-starting interpreter like JRuby. \
     If you are still seeing timeouts, consider running your linter `on save` and not `on change`.";

/// How often the blocking runner checks on its child.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A single process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub stdin: Option<String>,
    pub timeout: Duration,
    pub cancellation_key: Option<String>,
}

impl ExecutionRequest {
    /// Creates a request from a resolved command (executable first).
    pub fn new(command: Vec<String>, cwd: impl Into<PathBuf>) -> Result<Self, LinterError> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| LinterError::config("no rubocop command configured"))?;

        Ok(Self {
            program,
            args: parts.collect(),
            cwd: cwd.into(),
            stdin: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cancellation_key: None,
        })
    }

    /// Feeds `text` to the process on standard input.
    pub fn with_stdin(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Makes the run supersedable by later runs with the same key.
    pub fn with_cancellation_key(mut self, key: impl Into<String>) -> Self {
        self.cancellation_key = Some(key.into());
        self
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl From<std::process::Output> for RawOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// Handle for one keyed run.
#[derive(Debug)]
struct Ticket {
    key: String,
    token: u64,
    cancelled: Arc<Notify>,
}

/// Maps each cancellation key to the run that currently owns it.
#[derive(Debug, Default)]
pub struct SupersessionRegistry {
    next_token: AtomicU64,
    current: Mutex<HashMap<String, (u64, Arc<Notify>)>>,
}

impl SupersessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new run for `key`, cancelling the one it replaces.
    fn begin(&self, key: &str) -> Ticket {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(Notify::new());

        let previous = self
            .current
            .lock()
            .insert(key.to_string(), (token, cancelled.clone()));

        if let Some((old_token, old_cancel)) = previous {
            debug!("Run {} for {} superseded by {}", old_token, key, token);
            // notify_one stores a permit if the old run is not waiting yet.
            old_cancel.notify_one();
        }

        Ticket {
            key: key.to_string(),
            token,
            cancelled,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.current
            .lock()
            .get(&ticket.key)
            .is_some_and(|(token, _)| *token == ticket.token)
    }

    /// Releases the key if `ticket` still owns it.
    fn finish(&self, ticket: &Ticket) {
        let mut current = self.current.lock();
        if current
            .get(&ticket.key)
            .is_some_and(|(token, _)| *token == ticket.token)
        {
            current.remove(&ticket.key);
        }
    }

    /// Number of keys with a run in flight.
    pub fn in_flight(&self) -> usize {
        self.current.lock().len()
    }
}

/// Spawns RuboCop processes.
pub struct ProcessRunner {
    notifier: Arc<dyn Notifier>,
    registry: SupersessionRegistry,
}

impl ProcessRunner {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            registry: SupersessionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &SupersessionRegistry {
        &self.registry
    }

    /// Runs the request and collects its output. Any exit status is accepted.
    ///
    /// Returns `Ok(None)` when the run timed out or was superseded.
    pub async fn run(&self, request: ExecutionRequest) -> Result<Option<RawOutput>, LinterError> {
        let ticket = request
            .cancellation_key
            .as_deref()
            .map(|key| self.registry.begin(key));

        let result = self.execute(&request, ticket.as_ref()).await;

        if let Some(ticket) = &ticket {
            let current = self.registry.is_current(ticket);
            self.registry.finish(ticket);
            if !current {
                debug!("Discarding stale result for {}", ticket.key);
                return Ok(None);
            }
        }

        result
    }

    async fn execute(
        &self,
        request: &ExecutionRequest,
        ticket: Option<&Ticket>,
    ) -> Result<Option<RawOutput>, LinterError> {
        debug!(
            "Running {} {:?} in {}",
            request.program,
            request.args,
            request.cwd.display()
        );

        let mut cmd = tokio::process::Command::new(&request.program);
        cmd.args(&request.args)
            .current_dir(&request.cwd)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| LinterError::spawn(&request.program, e))?;

        if let (Some(text), Some(mut stdin)) = (request.stdin.clone(), child.stdin.take()) {
            tokio::spawn(async move {
                // The tool may exit before reading everything.
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    debug!("Failed to write stdin: {}", e);
                }
            });
        }

        let cancelled = async {
            match ticket {
                Some(ticket) => ticket.cancelled.notified().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = tokio::time::timeout(request.timeout, child.wait_with_output()) => match result {
                Ok(Ok(output)) => Ok(Some(output.into())),
                Ok(Err(e)) => Err(LinterError::Io(e)),
                Err(_) => {
                    self.report_timeout(request);
                    Ok(None)
                }
            },
            _ = cancelled => {
                debug!("Run for {} cancelled", request.program);
                Ok(None)
            }
        }
    }

    /// Blocking variant for user-triggered commands.
    ///
    /// Not supersedable. Returns `Ok(None)` on timeout.
    pub fn run_sync(&self, request: &ExecutionRequest) -> Result<Option<RawOutput>, LinterError> {
        debug!(
            "Running (blocking) {} {:?} in {}",
            request.program,
            request.args,
            request.cwd.display()
        );

        let mut child = std::process::Command::new(&request.program)
            .args(&request.args)
            .current_dir(&request.cwd)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LinterError::spawn(&request.program, e))?;

        if let (Some(text), Some(mut stdin)) = (request.stdin.clone(), child.stdin.take()) {
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    debug!("Failed to write stdin: {}", e);
                }
            });
        }

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let deadline = Instant::now() + request.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill timed out process: {}", e);
                }
                let _ = child.wait();
                self.report_timeout(request);
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Some(RawOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            exit_code: status.code(),
        }))
    }

    fn report_timeout(&self, request: &ExecutionRequest) {
        warn!(
            "{} timed out after {}ms",
            request.program,
            request.timeout.as_millis()
        );
        self.notifier
            .notify(Notification::info(LINTER_TIMEOUT_MSG).with_description(LINTER_TIMEOUT_DESC));
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
