//! Extraction engine invocation.
//!
//! The engine is an external program that reads an archive or a bare HTML
//! document on stdin and writes its result to stdout. One request runs the
//! engine exactly once. The input is written while the output is read, so
//! payloads larger than the pipe buffer cannot deadlock.

use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::result::ExtractionKind;
use crate::{ExtractError, Result};

/// How the engine input is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFraming {
    /// One or more archive entries (see [`crate::archive`]).
    Archive,
    /// A single bare HTML document.
    Single,
}

/// Engine configuration for one invocation: what to extract from which framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineMode {
    pub kind: ExtractionKind,
    pub framing: InputFraming,
}

impl EngineMode {
    pub const CONTENT_ARCHIVE: Self = Self::new(ExtractionKind::Content, InputFraming::Archive);
    pub const CONTENT_SINGLE: Self = Self::new(ExtractionKind::Content, InputFraming::Single);
    pub const TEXT_ARCHIVE: Self = Self::new(ExtractionKind::Text, InputFraming::Archive);
    pub const TEXT_SINGLE: Self = Self::new(ExtractionKind::Text, InputFraming::Single);

    pub const fn new(kind: ExtractionKind, framing: InputFraming) -> Self {
        Self { kind, framing }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let framing = match self.framing {
            InputFraming::Archive => "archive",
            InputFraming::Single => "single",
        };
        write!(f, "{}-{framing}", self.kind)
    }
}

/// Program and arguments for one engine front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable name or path. Run directly, without a shell.
    pub program: String,
    /// Arguments when the input is an archive.
    pub archive_args: Vec<String>,
    /// Arguments when the input is a single document.
    pub single_args: Vec<String>,
}

impl EngineCommand {
    pub fn new<I, S>(program: impl Into<String>, archive_args: I, single_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            archive_args: archive_args.into_iter().map(Into::into).collect(),
            single_args: single_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments for the given framing.
    pub fn args(&self, framing: InputFraming) -> &[String] {
        match framing {
            InputFraming::Archive => &self.archive_args,
            InputFraming::Single => &self.single_args,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Content (CETR) extractor, emitting XML.
    pub content: EngineCommand,
    /// Plain text extractor.
    pub text: EngineCommand,
    /// Seconds to wait for the engine before killing it.
    pub timeout: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content: EngineCommand::new(
                "nwc-toolkit-content-extractor",
                vec!["--archive", "--xml"],
                vec!["--single", "--xml"],
            ),
            text: EngineCommand::new(
                "nwc-toolkit-text-extractor",
                vec!["--archive", "-n", "1", "--NFKC", "--filter"],
                vec!["--single", "--NFKC", "--filter"],
            ),
            timeout: 60,
        }
    }
}

impl EngineConfig {
    /// Command for the given extraction kind.
    pub fn command(&self, kind: ExtractionKind) -> &EngineCommand {
        match kind {
            ExtractionKind::Content => &self.content,
            ExtractionKind::Text => &self.text,
        }
    }
}

/// Runs the extraction engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Feeds `input` to the engine and returns everything it wrote to stdout.
    ///
    /// Fails with [`ExtractError::EngineFailure`] when the process cannot be
    /// started or exits non-zero, and with [`ExtractError::EngineTimeout`]
    /// when it runs past the configured timeout (the process is killed).
    /// Engine stderr is discarded.
    pub async fn invoke(&self, mode: EngineMode, input: Vec<u8>) -> Result<Vec<u8>> {
        let command = self.config.command(mode.kind);
        let failure = |reason: String| ExtractError::EngineFailure { mode, reason };

        tracing::debug!(%mode, program = %command.program, input_bytes = input.len(), "starting engine");

        let mut child = Command::new(&command.program)
            .args(command.args(mode.framing))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failure(format!("failed to start {}: {e}", command.program)))?;

        let mut stdin = child.stdin.take().ok_or_else(|| failure("stdin not captured".to_string()))?;
        let mut stdout = child.stdout.take().ok_or_else(|| failure("stdout not captured".to_string()))?;

        let write_input = async move {
            let written = stdin.write_all(&input).await;
            // Dropping stdin closes the pipe so the engine sees EOF.
            drop(stdin);
            match written {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!(%mode, "engine closed stdin before reading all input");
                    Ok(())
                }
                other => other,
            }
        };
        let read_output = async move {
            let mut output = Vec::new();
            stdout.read_to_end(&mut output).await.map(|_| output)
        };

        let timeout = Duration::from_secs(self.config.timeout);
        let round_trip = tokio::time::timeout(timeout, async {
            let (written, output) = tokio::join!(write_input, read_output);
            let status = child.wait().await;
            (written, output, status)
        })
        .await;

        let (written, output, status) = match round_trip {
            Ok(outcome) => outcome,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(%mode, error = %e, "failed to kill timed out engine");
                }
                return Err(ExtractError::EngineTimeout { mode, timeout: self.config.timeout });
            }
        };

        let status = status.map_err(|e| failure(format!("failed to wait for engine: {e}")))?;
        if !status.success() {
            return Err(failure(format!("engine exited with {status}")));
        }
        written.map_err(|e| failure(format!("failed to write engine input: {e}")))?;
        let output = output.map_err(|e| failure(format!("failed to read engine output: {e}")))?;

        tracing::debug!(%mode, output_bytes = output.len(), "engine finished");
        Ok(output)
    }
}
