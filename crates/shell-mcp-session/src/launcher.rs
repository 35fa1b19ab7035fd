//! Command launching and the completion race.
//!
//! The launcher spawns one shell process per call, registers the session
//! before any event can reference it, and then races "process closed"
//! against the caller's timeout. The losing branch is never discarded: a
//! timed-out process keeps running and keeps mutating its session record
//! for later reads.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use shell_mcp_core::{
    validate_command, validate_timeout, Error, ExitStatusInfo, Result, ServerConfig, SessionId,
};

use crate::manager::ExecOutcome;
use crate::registry::{SessionRegistry, SharedSession};
use crate::search::StreamKind;
use crate::session::SessionState;

/// Resolve the shell to launch under: caller override, configured default,
/// then the platform default.
pub fn resolve_shell(override_shell: Option<String>, config: &ServerConfig) -> String {
    override_shell
        .or_else(|| config.session.default_shell.clone())
        .unwrap_or_else(default_shell)
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd.exe".to_string()
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Launch a command and wait for either the process to close or the timeout
/// to elapse, whichever happens first.
///
/// Validation failures and spawn failures reject the call before any session
/// exists. Once the process has spawned, everything that happens to it is
/// reported as data in the returned outcome or through subsequent reads,
/// never as an error.
pub async fn launch(
    registry: &SessionRegistry,
    config: &ServerConfig,
    command: String,
    shell_override: Option<String>,
    timeout_ms: u64,
) -> Result<ExecOutcome> {
    validate_command(&command, &config.limits)?;
    validate_timeout(timeout_ms, &config.limits)?;

    let shell = resolve_shell(shell_override, config);
    let working_directory = std::env::current_dir()?;

    let mut cmd = Command::new(&shell);
    if cfg!(windows) {
        cmd.arg("/C");
    } else {
        cmd.arg("-c");
    }
    cmd.arg(&command)
        .current_dir(&working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ShellNotFound(shell.clone()),
        std::io::ErrorKind::PermissionDenied => Error::SpawnPermissionDenied(shell.clone()),
        _ => Error::SpawnFailed(e.to_string()),
    })?;

    let pid = child.id().unwrap_or(0);
    let id = SessionId::new();
    info!(
        "Session created: id={}, pid={}, shell={}, command='{}'",
        id, pid, shell, command
    );

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    // The registry entry exists before any reader task runs, so no output
    // event can ever reference a missing session.
    let state = SessionState::new(
        id.clone(),
        pid,
        command,
        shell,
        working_directory,
    );
    let session = match registry
        .insert(state, config.session.max_sessions)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            let _ = child.start_kill();
            return Err(e);
        }
    };

    let stdout_task = stdout_pipe.map(|pipe| {
        spawn_stream_reader(Arc::clone(&session), pipe, StreamKind::Stdout)
    });
    let stderr_task = stderr_pipe.map(|pipe| {
        spawn_stream_reader(Arc::clone(&session), pipe, StreamKind::Stderr)
    });

    let (closed_tx, mut closed_rx) = watch::channel(false);
    spawn_waiter(
        child,
        Arc::clone(&session),
        registry.clone(),
        id.clone(),
        stdout_task,
        stderr_task,
        closed_tx,
        Duration::from_millis(config.session.completed_linger_ms),
    );

    // Completion race: first branch to resolve decides the verdict. On
    // timeout the process is deliberately left running in the background.
    let completed = matches!(
        tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            closed_rx.wait_for(|closed| *closed),
        )
        .await,
        Ok(Ok(_))
    );

    if completed {
        debug!("Session completed within timeout: id={}", id);
    } else {
        info!(
            "Session continues in background after {}ms: id={}, pid={}",
            timeout_ms, id, pid
        );
    }

    let state = session.lock().await;
    Ok(ExecOutcome {
        session_id: state.id.clone(),
        pid: state.pid,
        completed,
        stdout: state.stdout.trim().to_string(),
        stderr: state.stderr.trim().to_string(),
        exit: if completed {
            state.exit
        } else {
            ExitStatusInfo::default()
        },
        shell: state.shell.clone(),
        working_directory: state.working_directory.clone(),
    })
}

/// Read one pipe to EOF, appending decoded text to the session buffer.
fn spawn_stream_reader<R>(session: SharedSession, mut pipe: R, stream: StreamKind) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let mut state = session.lock().await;
                    match stream {
                        StreamKind::Stdout => state.append_stdout(&text),
                        StreamKind::Stderr => state.append_stderr(&text),
                    }
                }
                Err(e) => {
                    let mut state = session.lock().await;
                    state.append_stderr(&format!("\n[stream error: {e}]\n"));
                    break;
                }
            }
        }
    })
}

/// Wait for the process to close, apply the close event after all data
/// events have been observed, and schedule the post-completion linger.
#[allow(clippy::too_many_arguments)]
fn spawn_waiter(
    mut child: tokio::process::Child,
    session: SharedSession,
    registry: SessionRegistry,
    id: SessionId,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
    closed_tx: watch::Sender<bool>,
    linger: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let status = child.wait().await;

        // Stream completion ordering: the close event is applied only after
        // both readers have drained to EOF.
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        match status {
            Ok(status) => {
                session.lock().await.mark_closed(exit_status_info(&status));
            }
            Err(e) => {
                session
                    .lock()
                    .await
                    .mark_failed(&format!("wait failed: {e}"));
            }
        }

        let _ = closed_tx.send(true);
        registry.schedule_removal(id, linger);
    })
}

#[cfg(unix)]
fn exit_status_info(status: &std::process::ExitStatus) -> ExitStatusInfo {
    use std::os::unix::process::ExitStatusExt;
    ExitStatusInfo {
        code: status.code(),
        signal: status.signal(),
    }
}

#[cfg(windows)]
fn exit_status_info(status: &std::process::ExitStatus) -> ExitStatusInfo {
    ExitStatusInfo {
        code: status.code(),
        signal: None,
    }
}
