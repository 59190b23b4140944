//! Script execution through an external interpreter.
//!
//! One interpreter process per request: `<interpreter> <script>`, stdin
//! closed, stdout piped back to us, stderr inherited. The session is always
//! torn down the same way (pipe closed, child reaped) whatever happened
//! during the relay, so no descriptors or zombie processes outlive the
//! request.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWrite};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::Instant;

use crate::config::ScriptConfig;
use crate::error::ServeError;
use crate::http::response::ResponseHead;
use crate::http::writer::ResponseWriter;

/// How the relay loop ended.
#[derive(Debug)]
enum Relay {
    /// Interpreter closed its output
    Finished,
    ReadFailed(io::Error),
    TimedOut,
    ClientGone,
}

/// Runs scripts and relays their output.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: PathBuf,
    content_type: String,
    timeout: Option<Duration>,
    defer_headers: bool,
    chunk_size: usize,
}

impl ScriptRunner {
    pub fn new(cfg: &ScriptConfig, chunk_size: usize) -> Self {
        Self {
            interpreter: cfg.interpreter.clone(),
            content_type: cfg.content_type.clone(),
            timeout: cfg.timeout(),
            defer_headers: cfg.defer_headers,
            chunk_size,
        }
    }

    /// Executes `script` and streams its standard output to the client.
    ///
    /// By default the 200 head goes out before the interpreter has produced
    /// anything, so a script that fails silently still yields an empty 200.
    /// With `defer_headers` the head waits for the first chunk, and an
    /// interpreter that exits unsuccessfully without output becomes a 500.
    pub async fn run<W>(
        &self,
        writer: &mut ResponseWriter<'_, W>,
        script: &Path,
    ) -> Result<(), ServeError>
    where
        W: AsyncWrite + Unpin,
    {
        tracing::info!(script = %script.display(), "Executing script");

        let mut session = ScriptSession::spawn(&self.interpreter, script)?;
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let outcome = if self.defer_headers {
            self.relay(&mut session, writer, deadline).await
        } else {
            match writer.send_head(&self.head()).await {
                Ok(()) => self.relay(&mut session, writer, deadline).await,
                Err(e) => {
                    tracing::debug!(error = %e, "Client went away before body");
                    Relay::ClientGone
                }
            }
        };

        let status = session.finish(deadline).await;

        if writer.is_committed() {
            return Ok(());
        }

        // Deferred head and no output was relayed.
        match outcome {
            Relay::Finished if status.is_some_and(|s| s.success()) => {
                if let Err(e) = writer.send_head(&self.head()).await {
                    tracing::debug!(error = %e, "Client went away before head");
                }
                Ok(())
            }
            Relay::Finished => Err(ServeError::fault(
                "interpreter failed without output",
                io::Error::other(match status {
                    Some(s) => s.to_string(),
                    None => "exit status unavailable".to_string(),
                }),
            )),
            Relay::ReadFailed(e) => Err(ServeError::fault("read interpreter output", e)),
            Relay::TimedOut => Err(ServeError::fault(
                "interpreter timed out",
                io::Error::from(io::ErrorKind::TimedOut),
            )),
            Relay::ClientGone => Ok(()),
        }
    }

    fn head(&self) -> ResponseHead {
        ResponseHead::ok(self.content_type.as_str(), None)
    }

    async fn relay<W>(
        &self,
        session: &mut ScriptSession,
        writer: &mut ResponseWriter<'_, W>,
        deadline: Option<Instant>,
    ) -> Relay
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(self.chunk_size);

        loop {
            buf.clear();

            let read = match deadline {
                Some(deadline) => {
                    let res = tokio::time::timeout_at(deadline, session.read_chunk(&mut buf)).await;
                    match res {
                        Ok(read) => read,
                        Err(_) => {
                            tracing::warn!(
                                script = %session.script.display(),
                                sent = writer.body_written(),
                                "Script timed out, killing interpreter"
                            );
                            session.kill();
                            return Relay::TimedOut;
                        }
                    }
                }
                None => session.read_chunk(&mut buf).await,
            };

            match read {
                Ok(0) => return Relay::Finished,
                Ok(_) => {
                    if !writer.is_committed() {
                        if let Err(e) = writer.send_head(&self.head()).await {
                            tracing::debug!(error = %e, "Client went away before body");
                            return Relay::ClientGone;
                        }
                    }
                    if let Err(e) = writer.send_body(&buf).await {
                        tracing::debug!(error = %e, "Client went away mid-body");
                        return Relay::ClientGone;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        script = %session.script.display(),
                        "Reading interpreter output failed"
                    );
                    return Relay::ReadFailed(e);
                }
            }
        }
    }
}

/// One interpreter invocation: the child and the read end of its stdout.
struct ScriptSession {
    child: Child,
    output: Option<ChildStdout>,
    script: PathBuf,
    /// Set once a kill signal has been sent
    killed: bool,
}

impl ScriptSession {
    /// Creates the stdout pipe and starts the interpreter.
    ///
    /// The child's copy of the write end is the only one left once `spawn`
    /// returns, so end-of-stream shows up as soon as the child closes it.
    fn spawn(interpreter: &Path, script: &Path) -> Result<Self, ServeError> {
        let mut child = Command::new(interpreter)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    interpreter = %interpreter.display(),
                    "Failed to start interpreter"
                );
                ServeError::fault("spawn interpreter", e)
            })?;

        let Some(output) = child.stdout.take() else {
            // Dropping the child kills it; tokio reaps it in the background.
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "Interpreter already exited");
            }
            return Err(ServeError::fault(
                "capture interpreter output",
                io::Error::other("stdout pipe missing"),
            ));
        };

        Ok(Self {
            child,
            output: Some(output),
            script: script.to_path_buf(),
            killed: false,
        })
    }

    async fn read_chunk(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        match self.output.as_mut() {
            Some(output) => output.read_buf(buf).await,
            None => Ok(0),
        }
    }

    fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Interpreter already exited");
        }
    }

    /// Closes the pipe and reaps the child.
    ///
    /// With a deadline, a child still running when it passes is killed
    /// before the final wait. An already killed child is just reaped.
    async fn finish(mut self, deadline: Option<Instant>) -> Option<ExitStatus> {
        drop(self.output.take());

        let deadline = if self.killed { None } else { deadline };

        let waited = match deadline {
            Some(deadline) => {
                let res = tokio::time::timeout_at(deadline, self.child.wait()).await;
                match res {
                    Ok(waited) => waited,
                    Err(_) => {
                        tracing::warn!(script = %self.script.display(), "Interpreter outlived its deadline, killing");
                        self.kill();
                        self.child.wait().await
                    }
                }
            }
            None => self.child.wait().await,
        };

        match waited {
            Ok(status) => {
                if !status.success() {
                    tracing::warn!(
                        script = %self.script.display(),
                        code = ?status.code(),
                        %status,
                        "Script exited unsuccessfully"
                    );
                }
                Some(status)
            }
            Err(e) => {
                tracing::error!(error = %e, script = %self.script.display(), "Failed to reap interpreter");
                None
            }
        }
    }
}
