use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use answerdb_core::config::ExecSettings;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::kind::{Interpreters, ScriptKind};
use crate::outcome::ExecutionOutcome;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub timeout: Duration,
    pub max_concurrent: usize,
    pub interpreters: Interpreters,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&ExecSettings::default())
    }
}

impl From<&ExecSettings> for DispatcherConfig {
    fn from(settings: &ExecSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_concurrent: settings.max_concurrent.max(1),
            interpreters: Interpreters { python: settings.python.clone(), shell: settings.bash.clone() },
        }
    }
}

/// Runs solution scripts as child processes.
///
/// At most `max_concurrent` children run at once; further calls wait for a
/// slot. Children are killed when they exceed the timeout and when the
/// calling future is dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<DispatcherConfig>,
    slots: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { config: Arc::new(config), slots }
    }

    pub fn config(&self) -> &DispatcherConfig { &self.config }

    /// Run `script` with the interpreter for its extension and capture stdout.
    ///
    /// Never fails: spawn errors, unsupported extensions and timeouts come back
    /// as degraded outcomes.
    pub async fn execute(&self, script: &Path) -> ExecutionOutcome {
        let Some(kind) = ScriptKind::from_path(script) else {
            let extension = script.extension().map(|e| e.to_string_lossy().into_owned());
            debug!(script = %script.display(), ?extension, "unsupported script type");
            return ExecutionOutcome::Unsupported { extension };
        };

        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ExecutionOutcome::Failed { description: e.to_string() },
        };

        let interpreter = self.config.interpreters.command_for(kind);
        let mut command = Command::new(interpreter);
        command
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(interpreter, script = %script.display(), error = %e, "failed to spawn solution");
                return ExecutionOutcome::Failed { description: e.to_string() };
            }
        };
        let pid = child.id();
        // Dropped on every exit path, including cancellation of this future.
        let mut group = ProcessGroup::new(pid);
        debug!(%kind, interpreter, script = %script.display(), ?pid, "solution started");

        let timeout = self.config.timeout;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let finished = tokio::time::timeout(timeout, collect(&mut child, &mut stdout, &mut stderr)).await;
        match finished {
            Ok(Ok(exit_code)) => {
                let stdout = String::from_utf8_lossy(&stdout);
                let stderr = String::from_utf8_lossy(&stderr);
                if !stderr.trim().is_empty() {
                    debug!(script = %script.display(), stderr = %stderr.trim(), "solution stderr");
                }
                debug!(script = %script.display(), ?exit_code, "solution finished");
                ExecutionOutcome::Completed { output: stdout.trim().to_string(), exit_code }
            }
            Ok(Err(e)) => {
                warn!(script = %script.display(), error = %e, "solution run failed");
                terminate(&mut child, &mut group).await;
                ExecutionOutcome::Failed { description: e.to_string() }
            }
            Err(_) => {
                info!(script = %script.display(), ?pid, timeout_secs = timeout.as_secs_f64(), "solution timed out, killing");
                terminate(&mut child, &mut group).await;
                ExecutionOutcome::TimedOut { after: timeout, pid }
            }
        }
    }
}

/// How long output pipes may stay open after the script itself exited. A
/// background process that inherited stdout would otherwise hold the read
/// open until the timeout.
const PIPE_GRACE: Duration = Duration::from_millis(250);

/// Wait for exit while draining stdout/stderr into the given buffers. Reads
/// run concurrently with the wait so a chatty script cannot block on a full
/// pipe; once the script exits, reads get `PIPE_GRACE` to reach EOF and
/// whatever arrived by then is kept.
async fn collect(child: &mut Child, out: &mut Vec<u8>, err: &mut Vec<u8>) -> io::Result<Option<i32>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let pipes = async move {
        tokio::try_join!(drain(stdout, out), drain(stderr, err))?;
        Ok::<(), io::Error>(())
    };
    tokio::pin!(pipes);
    let wait = child.wait();
    tokio::pin!(wait);

    let status = tokio::select! {
        status = &mut wait => {
            let status = status?;
            match tokio::time::timeout(PIPE_GRACE, &mut pipes).await {
                Ok(read) => read?,
                Err(_) => debug!("output pipes still held by a leftover process, keeping partial output"),
            }
            status
        }
        read = &mut pipes => {
            read?;
            wait.await?
        }
    };
    Ok(status.code())
}

/// Append everything `pipe` yields to `buf`. Chunked reads keep partial
/// output in `buf` if the future is dropped.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, buf: &mut Vec<u8>) -> io::Result<()> {
    let Some(mut pipe) = pipe else { return Ok(()) };
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Kill the script's whole process group, then reap the interpreter.
async fn terminate(child: &mut Child, group: &mut ProcessGroup) {
    group.kill();
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill after failure/timeout");
    }
}

/// The process group a solution runs in. Everything the script forks stays
/// in it, so killing the group leaves nothing behind. Killed on drop.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.pgid.take() else { return };
        let Ok(raw) = i32::try_from(pgid) else { return };
        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid, error = %e, "failed to kill solution process group"),
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
