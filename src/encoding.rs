use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::frame::{DisplaySurface, PixelBuffer};

const FRAME_QUEUE_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    H264,
    ProRes4444,
}

impl VideoCodec {
    /// `.mov` gets ProRes 4444; everything else gets H.264.
    pub fn for_output(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ext == "mov" {
            Self::ProRes4444
        } else {
            Self::H264
        }
    }

    fn output_args(self) -> Vec<String> {
        match self {
            Self::H264 => vec![
                "-c:v".to_owned(),
                "libx264".to_owned(),
                "-pix_fmt".to_owned(),
                "yuv420p".to_owned(),
                "-crf".to_owned(),
                "18".to_owned(),
            ],
            Self::ProRes4444 => vec![
                "-c:v".to_owned(),
                "prores_ks".to_owned(),
                "-profile:v".to_owned(),
                "4444".to_owned(),
                "-pix_fmt".to_owned(),
                "yuva444p10le".to_owned(),
            ],
        }
    }
}

/// Streams raw RGBA frames into an `ffmpeg` child process on a writer thread.
pub struct FfmpegPipe {
    width: u32,
    height: u32,
    sender: Option<mpsc::SyncSender<Vec<u8>>>,
    worker: Option<JoinHandle<Result<()>>>,
}

impl FfmpegPipe {
    pub fn spawn(width: u32, height: u32, fps: u32, output_path: &Path) -> Result<Self> {
        Self::spawn_with_binary(Path::new("ffmpeg"), width, height, fps, output_path)
    }

    pub fn spawn_with_binary(
        ffmpeg_path: &Path,
        width: u32,
        height: u32,
        fps: u32,
        output_path: &Path,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("video size must be positive, got {width}x{height}");
        }
        if fps == 0 {
            bail!("fps must be > 0");
        }

        let args = ffmpeg_args(width, height, fps, output_path);
        let ffmpeg_path = ffmpeg_path.to_path_buf();
        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(FRAME_QUEUE_DEPTH);

        let worker = thread::Builder::new()
            .name("cppn-ffmpeg-writer".to_owned())
            .spawn(move || run_ffmpeg_process(&ffmpeg_path, &args, receiver))
            .context("failed to spawn ffmpeg writer thread")?;

        Ok(Self {
            width,
            height,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn write_frame(&self, rgba_frame: Vec<u8>) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("encoder has already been finalized"))?;
        sender
            .send(rgba_frame)
            .map_err(|_| anyhow!("ffmpeg writer stopped accepting frames"))
    }

    /// Closes the stream and waits for ffmpeg to exit.
    pub fn finish(mut self) -> Result<()> {
        drop(self.sender.take());

        let handle = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("ffmpeg worker thread missing"))?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("ffmpeg worker thread panicked")),
        }
    }
}

impl DisplaySurface for FfmpegPipe {
    fn present(&mut self, frame: &PixelBuffer) -> Result<()> {
        if (frame.width(), frame.height()) != (self.width, self.height) {
            bail!(
                "frame is {}x{} but the video stream was opened at {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
        }
        self.write_frame(frame.as_bytes().to_vec())
    }

    fn label(&self) -> &'static str {
        "ffmpeg"
    }
}

fn run_ffmpeg_process(
    ffmpeg_path: &Path,
    args: &[String],
    receiver: mpsc::Receiver<Vec<u8>>,
) -> Result<()> {
    let mut child = Command::new(ffmpeg_path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                anyhow!(
                    "ffmpeg executable not found (resolved_path={}). Install ffmpeg or render a PNG sequence instead.",
                    ffmpeg_path.display()
                )
            } else {
                anyhow!(
                    "failed to spawn ffmpeg process (resolved_path={}, args='{}'): {error}",
                    ffmpeg_path.display(),
                    args.join(" ")
                )
            }
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("failed to capture ffmpeg stdin"))?;
    let mut stderr_pipe = child.stderr.take();

    let mut frames = 0_u64;
    while let Ok(frame) = receiver.recv() {
        stdin
            .write_all(&frame)
            .context("failed to write frame to ffmpeg stdin")?;
        frames += 1;
    }

    stdin.flush().context("failed to flush ffmpeg stdin")?;
    drop(stdin);

    let status = child.wait().context("failed waiting for ffmpeg process")?;
    let stderr_tail = read_stderr_tail(&mut stderr_pipe)?;
    if !status.success() {
        bail!(
            "ffmpeg failed with status {status} (args='{}', stderr_tail='{}')",
            args.join(" "),
            stderr_tail
        );
    }
    debug!(frames, "ffmpeg finished");
    Ok(())
}

fn ffmpeg_args(width: u32, height: u32, fps: u32, output_path: &Path) -> Vec<String> {
    let mut args = ffmpeg_rawvideo_input_args(&format!("{width}x{height}"), &fps.to_string());
    args.extend(VideoCodec::for_output(output_path).output_args());
    args.push(output_path.to_string_lossy().into_owned());
    args
}

pub fn ffmpeg_rawvideo_input_args(size: &str, fps: &str) -> Vec<String> {
    vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
        "-f".to_owned(),
        "rawvideo".to_owned(),
        "-pix_fmt".to_owned(),
        "rgba".to_owned(),
        "-s:v".to_owned(),
        size.to_owned(),
        "-r".to_owned(),
        fps.to_owned(),
        "-i".to_owned(),
        "-".to_owned(),
        "-an".to_owned(),
    ]
}

fn read_stderr_tail(stderr: &mut Option<std::process::ChildStderr>) -> Result<String> {
    let Some(mut pipe) = stderr.take() else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)
        .context("failed reading ffmpeg stderr")?;
    let text = String::from_utf8_lossy(&buf).to_string();
    Ok(last_n_chars(&text, 500))
}

fn last_n_chars(s: &str, max_chars: usize) -> String {
    let chars = s.chars().collect::<Vec<_>>();
    let start = chars.len().saturating_sub(max_chars);
    chars[start..].iter().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_follows_extension() {
        assert_eq!(VideoCodec::for_output(Path::new("a.mov")), VideoCodec::ProRes4444);
        assert_eq!(VideoCodec::for_output(Path::new("a.MP4")), VideoCodec::H264);
        assert_eq!(VideoCodec::for_output(Path::new("noext")), VideoCodec::H264);
    }

    #[test]
    fn args_describe_rgba_input_and_end_with_output() {
        let args = ffmpeg_args(128, 128, 30, Path::new("out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s:v 128x128 -r 30 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        assert_eq!(last_n_chars("abcdef", 3), "def");
        assert_eq!(last_n_chars(" ab ", 10), "ab");
    }

    #[test]
    fn missing_binary_surfaces_on_finish() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipe = FfmpegPipe::spawn_with_binary(
            &dir.path().join("no-such-ffmpeg"),
            4,
            4,
            30,
            &dir.path().join("out.mp4"),
        )
        .expect("writer thread should start");
        let error = pipe.finish().expect_err("binary is missing");
        assert!(error.to_string().contains("ffmpeg executable not found"));
    }
}
