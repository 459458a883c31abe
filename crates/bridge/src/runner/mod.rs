mod args;
mod outcome;
mod stream;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use system_utils::privilege::PrivilegeProbe;
use system_utils::process::{apply_process_group, signal_group, Signal};
use tokio::process::Command;

use crate::config::BridgeConfig;
use crate::error::AskError;

use self::args::build_invocation_args;
pub(crate) use self::outcome::RunOutput;
use self::stream::read_stream_capture;

/// Launches the tool once per prompt and collects what it prints.
pub(crate) struct Runner {
    program: String,
    leading_args: Vec<String>,
    workdir: PathBuf,
    model: Option<String>,
    kill_grace: Option<Duration>,
    privilege: Arc<dyn PrivilegeProbe>,
}

impl Runner {
    pub(crate) fn new(config: &BridgeConfig, privilege: Arc<dyn PrivilegeProbe>) -> Self {
        let mut command = config.command.iter().cloned();
        let program = command.next().unwrap_or_default();
        Self {
            program,
            leading_args: command.collect(),
            workdir: config.workdir.clone(),
            model: config.model.clone(),
            kill_grace: config.kill_grace,
            privilege,
        }
    }

    pub(crate) fn invocation_args(&self, prompt: &str) -> Vec<String> {
        build_invocation_args(
            prompt,
            self.model.as_deref(),
            self.privilege.is_privileged(),
        )
    }

    /// Runs the tool with `prompt` and waits until it exits and both output
    /// streams close. Once `timeout` elapses the process group gets SIGTERM;
    /// with a kill grace configured it gets SIGKILL if still alive after that.
    pub(crate) async fn run(
        &self,
        id: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<RunOutput, AskError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd.args(self.invocation_args(prompt));
        cmd.current_dir(&self.workdir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // A dropped request (client gone) kills the tool; nobody is left to read its reply.
        cmd.kill_on_drop(true);
        apply_process_group(&mut cmd);

        let started_at = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::error!(
                    event = "ask.spawn_failed",
                    id = %id,
                    program = %self.program,
                    error = %err,
                    "failed to start tool"
                );
                return Err(AskError::Spawn(err));
            }
        };
        let pid = child.id();
        tracing::info!(
            event = "ask.spawned",
            id = %id,
            pid = ?pid,
            prompt_len = prompt.len(),
            timeout_ms = timeout.as_millis() as u64,
            "tool started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AskError::Internal("missing stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AskError::Internal("missing stderr pipe".to_string()))?;

        let mut collect = Box::pin(async move {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                read_stream_capture(stdout),
                read_stream_capture(stderr)
            );
            (status, stdout, stderr)
        });

        let mut timed_out = false;
        let mut escalated = false;
        let (status, stdout, stderr) = tokio::select! {
            result = &mut collect => result,
            _ = tokio::time::sleep(timeout) => {
                timed_out = true;
                tracing::warn!(
                    event = "ask.timeout",
                    id = %id,
                    pid = ?pid,
                    timeout_ms = timeout.as_millis() as u64,
                    "tool exceeded timeout, sending SIGTERM"
                );
                send_signal(id, pid, Signal::Terminate);
                match self.kill_grace {
                    Some(grace) => match tokio::time::timeout(grace, &mut collect).await {
                        Ok(result) => result,
                        Err(_) => {
                            escalated = true;
                            tracing::warn!(
                                event = "ask.kill_escalated",
                                id = %id,
                                pid = ?pid,
                                grace_ms = grace.as_millis() as u64,
                                "tool ignored SIGTERM, sending SIGKILL"
                            );
                            send_signal(id, pid, Signal::Kill);
                            collect.await
                        }
                    },
                    None => collect.await,
                }
            }
        };

        let status = status.map_err(|err| AskError::Internal(format!("wait on tool: {err}")))?;
        let stdout = stdout.map_err(|err| AskError::Internal(format!("read stdout: {err}")))?;
        let stderr = stderr.map_err(|err| AskError::Internal(format!("read stderr: {err}")))?;

        tracing::info!(
            event = "ask.completed",
            id = %id,
            code = ?status.code(),
            timed_out,
            escalated,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "tool finished"
        );

        Ok(RunOutput {
            status,
            stdout,
            stderr,
            timed_out,
            escalated,
        })
    }
}

fn send_signal(id: &str, pid: Option<u32>, signal: Signal) {
    let Some(pid) = pid else {
        return;
    };
    if let Err(err) = signal_group(pid, signal) {
        tracing::warn!(
            id = %id,
            pid,
            signal = ?signal,
            error = %err,
            "failed to signal tool process group"
        );
    }
}

/// Creates the scratch directory the tool runs in. Failures are logged only:
/// the directory may already exist or be provisioned another way.
pub(crate) fn ensure_workdir(path: &Path) {
    if let Err(err) = std::fs::create_dir_all(path) {
        tracing::warn!(
            workdir = %path.display(),
            error = %err,
            "failed to create tool working directory"
        );
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::{script_config, temp_dir, write_script};
    use bridge_protocol::ExitDetail;
    use system_utils::privilege::FixedPrivilege;

    fn runner(config: &BridgeConfig, privileged: bool) -> Runner {
        Runner::new(config, Arc::new(FixedPrivilege(privileged)))
    }

    #[tokio::test]
    async fn collects_stdout_and_exit_code() {
        let dir = temp_dir("ask-bridge-runner-ok");
        let script = write_script(&dir, "printf hi\n");
        let config = script_config(&dir, &script);
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        let response = output.into_response(false);
        assert_eq!(response.code, 0);
        assert_eq!(response.stdout, "hi");
        assert_eq!(response.stderr, "");
    }

    #[tokio::test]
    async fn passes_flags_and_prompt_as_last_argument() {
        let dir = temp_dir("ask-bridge-runner-args");
        let script = write_script(&dir, "for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done\n");
        let mut config = script_config(&dir, &script);
        config.model = Some("sonnet".to_string());
        let prompt = "hello world; echo injected";
        let output = runner(&config, false)
            .run("t", prompt, Duration::from_secs(10))
            .await
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(
            lines,
            vec![
                "-p",
                "--output-format",
                "text",
                "--strict-mcp-config",
                "--dangerously-skip-permissions",
                "--model",
                "sonnet",
                prompt,
            ]
        );
    }

    #[tokio::test]
    async fn privileged_run_omits_permission_bypass() {
        let dir = temp_dir("ask-bridge-runner-root");
        let script = write_script(&dir, "printf '%s\\n' \"$@\"\n");
        let config = script_config(&dir, &script);
        let output = runner(&config, true)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(!stdout.contains("--dangerously-skip-permissions"));
        assert!(stdout.ends_with("hello\n"));
    }

    #[tokio::test]
    async fn runs_inside_workdir() {
        let dir = temp_dir("ask-bridge-runner-cwd");
        let workdir = dir.join("scratch");
        ensure_workdir(&workdir);
        let script = write_script(&dir, "pwd\n");
        let mut config = script_config(&dir, &script);
        config.workdir = workdir.clone();
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        let printed = String::from_utf8(output.stdout).unwrap();
        assert_eq!(
            std::fs::canonicalize(printed.trim()).unwrap(),
            std::fs::canonicalize(&workdir).unwrap()
        );
    }

    #[tokio::test]
    async fn inherits_parent_environment() {
        let dir = temp_dir("ask-bridge-runner-env");
        let script = write_script(&dir, "printf '%s' \"$PATH\"\n");
        let config = script_config(&dir, &script);
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        let expected = std::env::var("PATH").unwrap_or_default();
        assert_eq!(String::from_utf8(output.stdout).unwrap(), expected);
    }

    #[tokio::test]
    async fn stdin_is_closed() {
        let dir = temp_dir("ask-bridge-runner-stdin");
        let script = write_script(&dir, "read x\nprintf '[%s]' \"$x\" >&2\n");
        let config = script_config(&dir, &script);
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!output.timed_out);
        let response = output.into_response(false);
        assert_eq!(response.stderr, "[]");
    }

    #[tokio::test]
    async fn passes_through_stderr_and_nonzero_exit() {
        let dir = temp_dir("ask-bridge-runner-fail");
        let script = write_script(&dir, "printf out\nprintf oops >&2\nexit 3\n");
        let config = script_config(&dir, &script);
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!output.timed_out);
        let response = output.into_response(false);
        assert_eq!(response.code, 3);
        assert_eq!(response.stdout, "out");
        assert_eq!(response.stderr, "oops");
    }

    #[tokio::test]
    async fn timeout_terminates_and_keeps_partial_output() {
        let dir = temp_dir("ask-bridge-runner-timeout");
        let script = write_script(&dir, "printf partial\nsleep 30\n");
        let config = script_config(&dir, &script);
        let started = Instant::now();
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(output.timed_out);
        assert!(!output.escalated);
        let response = output.into_response(true);
        assert_eq!(response.code, -1);
        assert_eq!(response.stdout, "partial");
        assert_eq!(
            response.exit,
            Some(ExitDetail::Signaled {
                signal: "SIGTERM".to_string()
            })
        );
    }

    #[tokio::test]
    async fn kill_grace_escalates_when_sigterm_is_ignored() {
        let dir = temp_dir("ask-bridge-runner-escalate");
        let script = write_script(&dir, "trap '' TERM\nsleep 30\n");
        let mut config = script_config(&dir, &script);
        config.kill_grace = Some(Duration::from_millis(200));
        let started = Instant::now();
        let output = runner(&config, false)
            .run("t", "hello", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(output.timed_out);
        assert!(output.escalated);
        let response = output.into_response(true);
        assert_eq!(response.code, -1);
        assert_eq!(response.force_killed, Some(true));
        assert_eq!(
            response.exit,
            Some(ExitDetail::Signaled {
                signal: "SIGKILL".to_string()
            })
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = temp_dir("ask-bridge-runner-missing");
        let config = BridgeConfig {
            command: vec![dir.join("no-such-tool").display().to_string()],
            workdir: dir,
            ..BridgeConfig::default()
        };
        let err = runner(&config, false)
            .run("t", "hello", Duration::from_secs(10))
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, AskError::Spawn(_)));
    }
}
