//! Raw frame decoding and encoding over FFmpeg pipes.
//!
//! The reader decodes the source to packed `bgr24` on stdout and the writer
//! encodes packed `bgr24` from stdin into the lossless intermediate. Both
//! children are spawned with `kill_on_drop`, so dropping a reader or writer
//! on an error path never leaves a process behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use venh_models::encoding::RAW_PIXEL_FORMAT;
use venh_models::{IntermediateProfile, VideoMetadata};

use crate::command::{resolve_binary, spawn_stderr_tail, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Sequential source of decoded frames.
#[async_trait]
pub trait FrameReader: Send {
    /// Next frame in decode order, or `None` once the source is exhausted.
    async fn read_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Release the decoder. Safe to call more than once.
    async fn close(&mut self);
}

/// Sequential sink for encoded frames.
#[async_trait]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()>;

    /// Flush and close the encoder. Safe to call more than once.
    async fn finish(&mut self) -> MediaResult<()>;
}

/// Opens readers and writers for the pipeline.
#[async_trait]
pub trait FrameIo: Send + Sync {
    async fn open_reader(
        &self,
        source: &Path,
        metadata: &VideoMetadata,
    ) -> MediaResult<Box<dyn FrameReader>>;

    async fn open_writer(
        &self,
        dest: &Path,
        metadata: &VideoMetadata,
    ) -> MediaResult<Box<dyn FrameWriter>>;
}

/// FFmpeg-backed frame I/O.
#[derive(Debug, Clone)]
pub struct FfmpegFrameIo {
    ffmpeg_bin: String,
    profile: IntermediateProfile,
}

impl Default for FfmpegFrameIo {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegFrameIo {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            profile: IntermediateProfile::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.ffmpeg_bin = binary.into();
        self
    }

    pub fn with_profile(mut self, profile: IntermediateProfile) -> Self {
        self.profile = profile;
        self
    }

    fn decode_command(&self, source: &Path) -> FfmpegCommand {
        FfmpegCommand::with_output("pipe:1")
            .add_input_spec(["-noautorotate"], source.to_string_lossy())
            // One output frame per decoded frame, even for variable frame rate sources.
            .output_args(["-fps_mode", "passthrough"])
            .output_args(["-f", "rawvideo", "-pix_fmt", RAW_PIXEL_FORMAT])
    }

    fn encode_command(&self, dest: &Path, metadata: &VideoMetadata) -> FfmpegCommand {
        FfmpegCommand::with_output(dest.to_string_lossy())
            .add_input_spec(
                [
                    "-f".to_string(),
                    "rawvideo".to_string(),
                    "-pix_fmt".to_string(),
                    self.profile.pix_fmt.clone(),
                    "-s".to_string(),
                    format!("{}x{}", metadata.width, metadata.height),
                    "-r".to_string(),
                    metadata.frame_rate.to_string(),
                ],
                "pipe:0",
            )
            .output_args(self.profile.to_ffmpeg_args())
    }
}

#[async_trait]
impl FrameIo for FfmpegFrameIo {
    async fn open_reader(
        &self,
        source: &Path,
        metadata: &VideoMetadata,
    ) -> MediaResult<Box<dyn FrameReader>> {
        if !source.is_file() {
            return Err(MediaError::media_open(source, "file does not exist"));
        }
        let program = resolve_binary(&self.ffmpeg_bin)?;
        let args = self.decode_command(source).build_args();
        debug!("Spawning decoder: {} {}", self.ffmpeg_bin, args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::media_open(source, e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::media_open(source, "decoder stdout not captured"))?;
        let stderr_task = child.stderr.take().map(spawn_stderr_tail);

        Ok(Box::new(FfmpegFrameReader {
            source: source.to_path_buf(),
            child: Some(child),
            stdout: Some(stdout),
            stderr_task,
            width: metadata.width,
            height: metadata.height,
            frame_size: metadata.frame_size(),
            next_index: 0,
        }))
    }

    async fn open_writer(
        &self,
        dest: &Path,
        metadata: &VideoMetadata,
    ) -> MediaResult<Box<dyn FrameWriter>> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let program = resolve_binary(&self.ffmpeg_bin)?;
        let args = self.encode_command(dest, metadata).build_args();
        debug!("Spawning encoder: {} {}", self.ffmpeg_bin, args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("encoder stdin not captured", None, None))?;
        let stderr_task = child.stderr.take().map(spawn_stderr_tail);

        Ok(Box::new(FfmpegFrameWriter {
            dest: dest.to_path_buf(),
            child: Some(child),
            stdin: Some(stdin),
            stderr_task,
            frame_size: metadata.frame_size(),
        }))
    }
}

/// Decoder child process plus its stdout pipe.
pub struct FfmpegFrameReader {
    source: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frame_size: usize,
    next_index: u64,
}

#[async_trait]
impl FrameReader for FfmpegFrameReader {
    async fn read_frame(&mut self) -> MediaResult<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.frame_size];
        let mut filled = 0;
        while filled < self.frame_size {
            let n = stdout.read(&mut data[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.frame_size {
            warn!(
                source = %self.source.display(),
                frame = self.next_index,
                "Truncated frame ({} of {} bytes), treating as end of input",
                filled,
                self.frame_size
            );
            return Ok(None);
        }

        let frame = Frame::new(self.width, self.height, self.next_index, data);
        self.next_index += 1;
        Ok(Some(frame))
    }

    async fn close(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            // The loop may stop before the decoder reaches the end.
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

/// Encoder child process plus its stdin pipe.
pub struct FfmpegFrameWriter {
    dest: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    frame_size: usize,
}

#[async_trait]
impl FrameWriter for FfmpegFrameWriter {
    async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        if frame.data.len() != self.frame_size {
            return Err(MediaError::FrameSize {
                expected: self.frame_size,
                actual: frame.data.len(),
            });
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::frame_write(frame.index, "encoder already finished"))?;
        stdin
            .write_all(&frame.data)
            .await
            .map_err(|e| MediaError::frame_write(frame.index, e.to_string()))
    }

    async fn finish(&mut self) -> MediaResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            // Encoder may already be gone; its exit status tells us.
            let _ = stdin.flush().await;
            drop(stdin);
        }
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().await?;
        let stderr_tail = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("encoder for {} exited with non-zero status", self.dest.display()),
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            ))
        }
    }
}
