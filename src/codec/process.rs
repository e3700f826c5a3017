//! Blocking subprocess invocation with an optional deadline

use crate::error::{BenchError, Result};
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Diagnostic text of a failed run: stderr, or stdout when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        let text = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&self.stdout)
        } else {
            stderr
        };
        let text = text.trim();
        if text.is_empty() {
            format!("exited with {}", self.status)
        } else {
            text.to_string()
        }
    }
}

/// Runs `program` to completion, feeding `input` on stdin when given.
///
/// Without a timeout the call blocks until the tool exits. With one, a tool
/// still running at the deadline is killed and reported as failed.
pub fn run_tool(
    program: &str,
    args: &[OsString],
    input: Option<&[u8]>,
    timeout: Option<Duration>,
) -> Result<ToolOutput> {
    debug!(program, ?args, stdin_bytes = input.map(|i| i.len()), "invoking external tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BenchError::external_tool(program, format!("could not be started: {}", e)))?;

    // Feed stdin and drain both pipes on their own threads so a chatty tool
    // can never block on a full pipe while we wait for it.
    let writer = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(data)) => {
            let data = data.to_vec();
            Some(thread::spawn(move || stdin.write_all(&data)))
        }
        _ => None,
    };
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = wait_with_deadline(&mut child, program, timeout)?;

    if let Some(writer) = writer {
        match join(writer, program)? {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }
    }
    let stdout = join(stdout_reader, program)??;
    let stderr = join(stderr_reader, program)??;

    debug!(program, %status, stdout_bytes = stdout.len(), "external tool finished");
    Ok(ToolOutput { status, stdout, stderr })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn join<T>(handle: JoinHandle<T>, program: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| BenchError::external_tool(program, "pipe worker panicked"))
}

fn wait_with_deadline(child: &mut Child, program: &str, timeout: Option<Duration>) -> Result<ExitStatus> {
    let Some(timeout) = timeout else {
        return Ok(child.wait()?);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BenchError::external_tool(
                program,
                format!("timed out after {:.1}s", timeout.as_secs_f64()),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
