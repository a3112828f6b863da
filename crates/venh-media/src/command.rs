//! Building and running one-shot FFmpeg invocations.
//!
//! Long-lived pipe processes (frame decode/encode) live in `frame_io`; this
//! module covers commands that run to completion, such as the remux.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Argument list for one FFmpeg invocation: global flags, then each input
/// with its own leading arguments, then output arguments and the target.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs, each with the arguments that precede its `-i`
    inputs: Vec<(Vec<String>, String)>,
    /// Output target (a path or `pipe:1`)
    output: String,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a command with a single file input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::with_output(output.as_ref().to_string_lossy()).add_input(input)
    }

    /// Create a command with no inputs yet.
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.into(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a file input.
    pub fn add_input(self, input: impl AsRef<Path>) -> Self {
        let input = input.as_ref().to_string_lossy().to_string();
        self.add_input_spec(Vec::<String>::new(), input)
    }

    /// Add an input with its own leading arguments, e.g. a raw pipe.
    pub fn add_input_spec<I, S>(mut self, args: I, input: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs
            .push((args.into_iter().map(Into::into).collect(), input.into()));
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// FFmpeg `-v` level, `error` unless changed.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Full argument vector, without the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for (input_args, input) in &self.inputs {
            args.extend(input_args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.clone());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.clone());

        args
    }
}

/// Runs an [`FfmpegCommand`] to completion, optionally under a deadline.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: String,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            timeout_secs: None,
        }
    }

    /// Use a different executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Kill the process if it is still running after `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Run `cmd`. A non-zero exit carries the stderr tail and exit code.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = resolve_binary(&self.binary)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary, args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stderr not captured", None, None))?;
        let stderr_handle = spawn_stderr_tail(stderr);

        let status = match self.wait_for_completion(&mut child).await {
            Ok(status) => status,
            Err(e) => {
                stderr_handle.abort();
                return Err(e);
            }
        };

        let stderr_tail = stderr_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("{} exited with non-zero status", self.binary),
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            ))
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.timeout_secs {
            Some(timeout_secs) => {
                match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(result) => Ok(result?),
                    Err(_) => {
                        warn!(
                            "{} timed out after {} seconds, killing process",
                            self.binary, timeout_secs
                        );
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(timeout_secs))
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

/// Drain a child's stderr so it never blocks, keeping the last lines.
pub(crate) fn spawn_stderr_tail(stderr: ChildStderr) -> JoinHandle<String> {
    let mut reader = BufReader::new(stderr).lines();
    tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        while let Ok(Some(line)) = reader.next_line().await {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect::<Vec<_>>().join("\n")
    })
}

/// Resolve an executable name or path.
pub fn resolve_binary(binary: &str) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::FfmpegNotFound(binary.to_string()))
}
