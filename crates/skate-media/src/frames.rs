//! FFmpeg-backed frame source.
//!
//! Decodes a video to raw RGB24 frames through an `ffmpeg` child process and
//! hands them out one at a time. Only one frame buffer is alive at a time.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use skate_models::RgbFrame;
use skate_scoring::{FrameSource, ScoringResult};

use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;

/// Streams decoded frames from `ffmpeg -f rawvideo -pix_fmt rgb24`.
///
/// The child process is killed when the source is dropped, so abandoning a
/// video early never leaves a decoder running.
pub struct FfmpegFrameSource {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    frame_rate: Option<f64>,
    next_index: u64,
    finished: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl FfmpegFrameSource {
    /// Start decoding `path` at its native resolution.
    pub fn open(path: impl AsRef<Path>, info: &VideoInfo) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-an", "-pix_fmt", "rgb24", "-f", "rawvideo", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None)
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stdout", None, None)
        })?;

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = ?info.fps,
            "Started FFmpeg frame decoding"
        );

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout,
            width: info.width,
            height: info.height,
            frame_rate: info.fps,
            next_index: 0,
            finished: false,
            cancel: None,
        })
    }

    /// Report end of stream once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn read_frame(&mut self) -> MediaResult<Option<Vec<u8>>> {
        let frame_len = RgbFrame::byte_len(self.width, self.height);
        let mut buffer = vec![0u8; frame_len];
        let filled = fill_buffer(&mut self.stdout, &mut buffer)?;

        if filled == frame_len {
            return Ok(Some(buffer));
        }
        if filled > 0 {
            warn!(
                path = %self.path.display(),
                bytes = filled,
                expected = frame_len,
                "Discarding truncated trailing frame"
            );
        }
        Ok(None)
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        let status = self.child.wait()?;
        if !status.success() && self.next_index == 0 {
            return Err(MediaError::ffmpeg_failed(
                format!("FFmpeg could not decode {}", self.path.display()),
                None,
                status.code(),
            ));
        }
        if !status.success() {
            warn!(
                path = %self.path.display(),
                exit_code = ?status.code(),
                frames = self.next_index,
                "FFmpeg exited with an error after decoding some frames"
            );
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    fn next_frame(&mut self) -> ScoringResult<Option<RgbFrame>> {
        if self.finished {
            return Ok(None);
        }
        if self.is_cancelled() {
            debug!(path = %self.path.display(), frames = self.next_index, "Decoding cancelled");
            return Ok(None);
        }

        match self.read_frame()? {
            Some(data) => {
                let frame = RgbFrame::new(self.next_index, self.width, self.height, data);
                self.next_index += 1;
                Ok(Some(frame))
            }
            None => {
                self.finish()?;
                Ok(None)
            }
        }
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Best-effort; the process may already have exited.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Read until `buffer` is full or the stream ends. Returns bytes read.
fn fill_buffer(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fill_buffer_full_and_partial() {
        let mut reader = Cursor::new(vec![1u8; 10]);
        let mut buffer = [0u8; 4];
        assert_eq!(fill_buffer(&mut reader, &mut buffer).unwrap(), 4);
        assert_eq!(fill_buffer(&mut reader, &mut buffer).unwrap(), 4);
        assert_eq!(fill_buffer(&mut reader, &mut buffer).unwrap(), 2);
        assert_eq!(fill_buffer(&mut reader, &mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_open_missing_file() {
        let info = VideoInfo {
            duration: 1.0,
            width: 4,
            height: 4,
            fps: Some(30.0),
            codec: "h264".to_string(),
        };
        let result = FfmpegFrameSource::open("/nonexistent/clip.mov", &info);
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[test]
    #[ignore = "requires ffmpeg"]
    fn test_cancel_flag_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("testsrc.mp4");
        let status = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi"])
            .args(["-i", "testsrc=size=64x48:rate=10", "-t", "3", "-pix_fmt", "yuv420p"])
            .arg(&clip)
            .status()
            .unwrap();
        assert!(status.success());

        let info = VideoInfo {
            duration: 3.0,
            width: 64,
            height: 48,
            fps: Some(10.0),
            codec: "h264".to_string(),
        };
        let flag = Arc::new(AtomicBool::new(false));
        let mut source = FfmpegFrameSource::open(&clip, &info)
            .unwrap()
            .with_cancel_flag(flag.clone());

        for expected in 0..2u64 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.index, expected);
            assert_eq!(frame.data.len(), RgbFrame::byte_len(64, 48));
        }

        flag.store(true, Ordering::Relaxed);
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }
}
