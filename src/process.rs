//! Blocking subprocess invocation with a bounded wait.
//!
//! Both runners go through [`invoke`]: the child is started with piped
//! stdout and stderr, both pipes are drained on helper threads, and the
//! caller polls until the child exits, the timeout elapses, or the run is
//! cancelled. In the latter two cases the child is killed and reaped.
//!
//! Killing the child does not reach its descendants: a wrapper script's
//! `java` keeps the pipes open after the script dies. Once the child is
//! gone the pipes get [`DRAIN_GRACE`] to reach end of file; whatever is
//! still held open past that is abandoned so the run moves on.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the output pipes may stay open after the child has been reaped.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Shared flag that asks the harness to stop at the next opportunity.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a child process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(ExitStatus),
    /// Killed after exceeding the timeout.
    TimedOut(Duration),
    /// Killed because the run was cancelled.
    Cancelled,
}

impl Termination {
    pub fn success(&self) -> bool {
        matches!(self, Termination::Exited(status) if status.success())
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Termination::Exited(status) => status.code(),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Termination::Exited(status) => match status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            },
            Termination::TimedOut(limit) => {
                format!("killed after exceeding the {}s timeout", limit.as_secs_f64())
            }
            Termination::Cancelled => "killed because the run was cancelled".to_string(),
        }
    }
}

/// Everything captured from one finished invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// A fully rendered command line.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub working_dir: &'a Path,
    pub timeout: Option<Duration>,
}

impl Invocation<'_> {
    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs the invocation to completion, timeout, or cancellation.
///
/// Only a failure to spawn (or to poll) the child is an `Err`; any exit
/// status, including a kill, is reported through [`Termination`].
pub fn invoke(invocation: &Invocation<'_>, cancel: &CancelToken) -> io::Result<ProcessOutput> {
    tracing::debug!(command = %invocation.command_line(), cwd = %invocation.working_dir.display(), "spawning");
    let started = Instant::now();

    let mut child = Command::new(invocation.program)
        .args(invocation.args)
        .current_dir(invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let termination = match wait_bounded(&mut child, invocation.timeout, cancel) {
        Ok(termination) => termination,
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }
    };

    let drain_deadline = Instant::now() + DRAIN_GRACE;
    let output = ProcessOutput {
        termination,
        stdout: collect(stdout, drain_deadline),
        stderr: collect(stderr, drain_deadline),
        elapsed: started.elapsed(),
    };
    tracing::debug!(
        program = invocation.program,
        outcome = %output.termination.describe(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "process finished"
    );
    Ok(output)
}

fn wait_bounded(
    child: &mut Child,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> io::Result<Termination> {
    let deadline = timeout.map(|limit| (Instant::now() + limit, limit));
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Termination::Exited(status));
        }
        let stop = if cancel.is_cancelled() {
            Some(Termination::Cancelled)
        } else {
            match deadline {
                Some((at, limit)) if Instant::now() >= at => Some(Termination::TimedOut(limit)),
                _ => None,
            }
        };
        if let Some(termination) = stop {
            tracing::warn!(pid = child.id(), "{}", termination.describe());
            let _ = child.kill();
            child.wait()?;
            return Ok(termination);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = sender.send(buf);
        });
        receiver
    })
}

fn collect(receiver: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    let Some(receiver) = receiver else {
        return String::new();
    };
    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("output pipe still held open by a descendant process; abandoning it");
            String::new()
        }
        Err(RecvTimeoutError::Disconnected) => String::new(),
    }
}
