//! External lint process invocation
//!
//! A started run is an owned [`LintRun`]: the coordinator awaits its output
//! and keeps the [`CancelHandle`] to terminate the process on supersession.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::lint::error::InvocationError;
use crate::lint::root::ProjectRoot;

/// Raw output of a run that finished with an accepted exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOutput {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
}

/// Terminates the process of the run it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving side of a [`CancelHandle`].
#[derive(Debug)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// Resolves once `cancel` was called. Never resolves if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// An in-flight lint process.
pub struct LintRun {
    pub cancel: CancelHandle,
    pub output: BoxFuture<'static, Result<LintOutput, InvocationError>>,
}

/// Starts lint runs against a project root.
pub trait Linter: Send + Sync + 'static {
    fn start(&self, root: &ProjectRoot) -> Result<LintRun, InvocationError>;
}

/// Runs the configured command with the project root as working directory.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    command: Vec<String>,
    issues_exit_code: i32,
    timeout: Option<Duration>,
}

impl CommandLinter {
    pub fn new(command: Vec<String>, issues_exit_code: i32, timeout: Option<Duration>) -> Self {
        Self {
            command,
            issues_exit_code,
            timeout,
        }
    }
}

impl Linter for CommandLinter {
    fn start(&self, root: &ProjectRoot) -> Result<LintRun, InvocationError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(InvocationError::EmptyCommand)?;

        debug!("Running {:?} in {}", self.command, root);

        let child = Command::new(program)
            .args(args)
            .current_dir(root.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InvocationError::Spawn {
                program: program.clone(),
                source,
            })?;

        let (cancel, signal) = cancel_pair();
        let output = wait_for_output(
            child,
            program.clone(),
            self.issues_exit_code,
            self.timeout,
            signal,
        )
        .boxed();

        Ok(LintRun { cancel, output })
    }
}

enum Finish {
    Exited(io::Result<(ExitStatus, Vec<u8>, Vec<u8>)>),
    Cancelled,
    TimedOut(Duration),
}

async fn wait_for_output(
    mut child: Child,
    program: String,
    issues_exit_code: i32,
    timeout: Option<Duration>,
    mut signal: CancelSignal,
) -> Result<LintOutput, InvocationError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let deadline = async {
        match timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                limit
            }
            None => std::future::pending().await,
        }
    };

    let finish = tokio::select! {
        result = collect(&mut child, stdout, stderr) => Finish::Exited(result),
        _ = signal.cancelled() => Finish::Cancelled,
        limit = deadline => Finish::TimedOut(limit),
    };

    match finish {
        Finish::Exited(result) => {
            let (status, stdout, stderr) = result?;
            match status.code() {
                Some(code) if code == 0 || code == issues_exit_code => Ok(LintOutput {
                    stdout,
                    exit_code: code,
                }),
                status => Err(InvocationError::UnexpectedStatus {
                    program,
                    status,
                    stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                }),
            }
        }
        Finish::Cancelled => {
            debug!("Terminating superseded {} run", program);
            terminate(&mut child).await;
            Err(InvocationError::Cancelled)
        }
        Finish::TimedOut(timeout) => {
            warn!("{} exceeded {:?}, terminating", program, timeout);
            terminate(&mut child).await;
            Err(InvocationError::TimedOut { program, timeout })
        }
    }
}

async fn collect(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let read_stdout = async {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok::<_, io::Error>(buf)
    };
    let read_stderr = async {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok::<_, io::Error>(buf)
    };

    let (stdout, stderr, status) = tokio::try_join!(read_stdout, read_stderr, child.wait())?;
    Ok((status, stdout, stderr))
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill lint process: {}", e);
    }
}
