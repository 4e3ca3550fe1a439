//! Subprocess execution with stdin feed, output capture and timeout.
//!
//! On Unix the command runs in its own process group, and a timeout kills the
//! whole group so wrappers such as `sh -c` or launcher scripts cannot keep
//! the output pipes open. After a kill, output readers get a short grace
//! period and are then abandoned.

use crate::error::{CrewError, Result};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output readers may keep draining after a timeout kill.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Captured result of one command invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (None if killed or terminated by a signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Run `command_line` in `workdir`, writing `stdin` to the process.
///
/// The command line is split with shell quoting rules but not run through a
/// shell. The process (and on Unix its whole group) is killed once `timeout`
/// elapses.
pub fn run_command(
    command_line: &str,
    stdin: &str,
    environment: &BTreeMap<String, String>,
    workdir: &Path,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let args = shell_words::split(command_line).map_err(|e| {
        CrewError::Engine(format!(
            "failed to parse command '{}': {}; check for unmatched quotes",
            command_line, e
        ))
    })?;
    let Some((program, rest)) = args.split_first() else {
        return Err(CrewError::Engine(format!(
            "command is empty after parsing: '{}'",
            command_line
        )));
    };

    let mut command = Command::new(program);
    command
        .args(rest)
        .current_dir(workdir)
        .envs(environment)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|e| {
        CrewError::Engine(format!(
            "failed to start '{}': {}; ensure it is installed and on PATH",
            program, e
        ))
    })?;

    let writer = child.stdin.take().map(|mut pipe| {
        let input = stdin.to_string();
        thread::spawn(move || {
            // The command may exit without reading its input.
            match pipe.write_all(input.as_bytes()) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                    tracing::debug!(error = %e, "failed to write command stdin");
                }
                _ => {}
            }
        })
    });
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let (exit_code, timed_out) = wait_with_timeout(&mut child, timeout)?;

    // Readers of a killed command may be held open by stray descendants.
    let deadline = timed_out.then(|| Instant::now() + KILL_GRACE);
    let stdout = collect(stdout, deadline)?;
    let stderr = collect(stderr, deadline)?;
    if !timed_out {
        if let Some(handle) = writer {
            let _ = handle.join();
        }
    }

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
        duration: started.elapsed(),
        timed_out,
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe
            .read_to_end(&mut buf)
            .map(|_| String::from_utf8_lossy(&buf).into_owned());
        let _ = tx.send(result);
    });
    rx
}

fn collect(
    reader: Option<Receiver<io::Result<String>>>,
    deadline: Option<Instant>,
) -> Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let received = match deadline {
        None => reader.recv().map_err(|_| RecvTimeoutError::Disconnected),
        Some(deadline) => reader.recv_timeout(deadline.saturating_duration_since(Instant::now())),
    };
    match received {
        Ok(result) => {
            result.map_err(|e| CrewError::Engine(format!("failed to read command output: {}", e)))
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("output pipe still held open after kill; discarding remaining output");
            Ok(String::new())
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(CrewError::Engine("output reader thread panicked".to_string()))
        }
    }
}

/// Returns (exit_code, timed_out).
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(Option<i32>, bool)> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status.code(), false)),
            Ok(None) if start.elapsed() >= timeout => {
                kill_tree(child);
                let _ = child.wait();
                return Ok((None, true));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(CrewError::Engine(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

/// Kill the child's whole process group on Unix, or just the child elsewhere.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: the child leads its own group (process_group(0) at spawn).
            if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
                return;
            }
        }
    }
    let _ = child.kill();
}
