//! Typed failures for a single manifest item.
//!
//! None of these abort an import run. The orchestrator collects them on the
//! item's `ImportResult`, prints a notice and moves on to the next entry.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Failure of an external tool invocation (type sniffer, tag writer, remuxer)
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} produced no usable output for {}", .path.display())]
    UnexpectedOutput { tool: String, path: PathBuf },
}

/// Everything that can go wrong while processing one manifest item
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("type detection failed: {0}")]
    Detection(#[source] ToolError),

    #[error("container repair failed: {0}")]
    Repair(#[source] ToolError),

    #[error("metadata write failed: {0}")]
    Tagging(#[source] ToolError),

    #[error("unparsable capture timestamp {0:?}")]
    Timestamp(String),
}
