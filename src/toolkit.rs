//! External media tooling behind a capability interface.
//!
//! The pipeline only needs three things from the outside world: sniff a
//! file's real type, write metadata tags in place, and remux a video with
//! stream copy. `ExternalToolkit` provides them by shelling out to
//! `exiftool` and `ffmpeg`; tests substitute an in-memory implementation.

use log::debug;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::ToolError;
use crate::metadata::TagAssignment;

/// The operations the import pipeline needs from media tooling
pub trait MediaToolkit {
    /// Returns a lowercase type token for the file (e.g. "jpeg", "mp4")
    fn read_type(&self, path: &Path) -> impl Future<Output = Result<String, ToolError>>;

    /// Writes all tag assignments into the file in place
    fn write_tags(
        &self,
        path: &Path,
        tags: &[TagAssignment],
    ) -> impl Future<Output = Result<(), ToolError>>;

    /// Re-multiplexes `input` into `output` without re-encoding
    fn remux(&self, input: &Path, output: &Path) -> impl Future<Output = Result<(), ToolError>>;
}

impl<T: MediaToolkit + ?Sized> MediaToolkit for &T {
    async fn read_type(&self, path: &Path) -> Result<String, ToolError> {
        (**self).read_type(path).await
    }

    async fn write_tags(&self, path: &Path, tags: &[TagAssignment]) -> Result<(), ToolError> {
        (**self).write_tags(path, tags).await
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        (**self).remux(input, output).await
    }
}

/// `MediaToolkit` backed by the `exiftool` and `ffmpeg` command-line tools
#[derive(Debug, Clone)]
pub struct ExternalToolkit {
    exiftool: String,
    ffmpeg: String,
}

impl ExternalToolkit {
    pub fn new(exiftool: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        Self {
            exiftool: exiftool.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Runs a tool to completion and returns its stdout on success
    async fn run(&self, tool: &str, command: &mut Command) -> Result<Vec<u8>, ToolError> {
        debug!("Running {command:?}");
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Exit {
                tool: tool.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for ExternalToolkit {
    fn default() -> Self {
        Self::new("exiftool", "ffmpeg")
    }
}

impl MediaToolkit for ExternalToolkit {
    async fn read_type(&self, path: &Path) -> Result<String, ToolError> {
        let stdout = self
            .run(
                &self.exiftool,
                Command::new(&self.exiftool)
                    .args(["-s", "-s", "-s", "-FileType"])
                    .arg(path),
            )
            .await?;

        let token = String::from_utf8_lossy(&stdout).trim().to_lowercase();
        if token.is_empty() {
            return Err(ToolError::UnexpectedOutput {
                tool: self.exiftool.clone(),
                path: path.to_path_buf(),
            });
        }
        Ok(token)
    }

    async fn write_tags(&self, path: &Path, tags: &[TagAssignment]) -> Result<(), ToolError> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut command = Command::new(&self.exiftool);
        command.args(["-q", "-q", "-overwrite_original"]);
        command.args(tags.iter().map(TagAssignment::to_exiftool_arg));
        command.arg(path);

        self.run(&self.exiftool, &mut command).await.map(|_| ())
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-y", "-v", "error", "-err_detect", "ignore_err", "-i"])
            .arg(input)
            .args(["-map", "0", "-c", "copy", "-movflags", "+faststart"])
            .arg(output);

        self.run(&self.ffmpeg, &mut command).await.map(|_| ())
    }
}
