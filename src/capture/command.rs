use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::Command;

use super::{Frame, FrameSource};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Grabs a frame by running an external capture program and decoding its
/// stdout, e.g. `ffmpeg -f v4l2 -i /dev/video0 -frames:v 1 -f image2 -`.
#[derive(Debug, Clone)]
pub struct CommandFrameSource {
    program: String,
    args: Vec<String>,
    quality: u8,
}

impl CommandFrameSource {
    pub fn new(program: impl Into<String>, args: Vec<String>, quality: u8) -> Self {
        Self {
            program: program.into(),
            args,
            quality,
        }
    }

    /// Splits a command line on whitespace. No shell quoting is interpreted.
    pub fn parse(command_line: &str, quality: u8) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("capture command is empty"))?;
        Ok(Self::new(program, parts.collect(), quality))
    }

    async fn run(&self) -> Result<Frame> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        if output.stdout.is_empty() {
            bail!("{} produced no image data", self.program);
        }

        let quality = self.quality;
        let bytes = output.stdout;
        tokio::task::spawn_blocking(move || Frame::from_image_bytes(&bytes, quality))
            .await
            .context("frame decode worker join failed")?
    }
}

impl FrameSource for CommandFrameSource {
    async fn capture_frame(&self) -> Option<Frame> {
        match self.run().await {
            Ok(frame) => {
                log_debug!("{} captured {} bytes", self.program, frame.jpeg_bytes().len());
                Some(frame)
            }
            Err(err) => {
                log_warn!("command capture failed: {err:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::test_png;
    use tempfile::TempDir;

    #[test]
    fn parse_splits_program_and_args() {
        let source = CommandFrameSource::parse("ffmpeg -i /dev/video0 -frames:v 1 -", 70).unwrap();
        assert_eq!(source.program, "ffmpeg");
        assert_eq!(source.args, vec!["-i", "/dev/video0", "-frames:v", "1", "-"]);
        assert!(CommandFrameSource::parse("   ", 70).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn decodes_image_written_to_stdout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, test_png(6, 3)).unwrap();

        let source = CommandFrameSource::new("cat", vec![path.display().to_string()], 70);
        let frame = source.capture_frame().await.unwrap();
        assert_eq!(frame.dimensions(), (6, 3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_yields_none() {
        let source = CommandFrameSource::new("false", Vec::new(), 70);
        assert!(source.capture_frame().await.is_none());
    }

    #[tokio::test]
    async fn missing_program_yields_none() {
        let source = CommandFrameSource::new("hawkwatch-no-such-capture-tool", Vec::new(), 70);
        assert!(source.capture_frame().await.is_none());
    }
}
