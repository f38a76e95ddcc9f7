//! Pose sources: where landmark frames come from.
//!
//! Pose estimation runs outside this workspace. A [`PoseSource`] turns a
//! video path into per-frame landmarks, either by reading a pre-computed
//! JSON sidecar, by spawning an external estimator, or (for tests and demos)
//! from frames held in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use formlab_core::{defaults, Error, PoseFrame, Result};

/// Extracts pose frames from a video.
///
/// Frames in which no person was detected carry empty landmarks; the
/// pipeline drops them.
#[async_trait]
pub trait PoseSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn extract(&self, video: &Path) -> Result<Vec<PoseFrame>>;
}

/// Estimator output: either a bare list of frames or `{"frames": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PoseDocument {
    Frames(Vec<PoseFrame>),
    Wrapped { frames: Vec<PoseFrame> },
}

/// Parse estimator JSON, deriving joint angles the document left out.
pub fn parse_pose_json(bytes: &[u8]) -> Result<Vec<PoseFrame>> {
    let document: PoseDocument = serde_json::from_slice(bytes)
        .map_err(|e| Error::Extractor(format!("Invalid pose data: {}", e)))?;
    let mut frames = match document {
        PoseDocument::Frames(frames) => frames,
        PoseDocument::Wrapped { frames } => frames,
    };
    for frame in &mut frames {
        if frame.angles.is_empty() {
            frame.derive_angles();
        }
    }
    Ok(frames)
}

// =============================================================================
// ADAPTERS
// =============================================================================

/// Returns the same frames for every video.
#[derive(Debug, Clone, Default)]
pub struct StaticPoseSource {
    frames: Vec<PoseFrame>,
}

impl StaticPoseSource {
    pub fn new(frames: Vec<PoseFrame>) -> Self {
        Self { frames }
    }
}

#[async_trait]
impl PoseSource for StaticPoseSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn extract(&self, _video: &Path) -> Result<Vec<PoseFrame>> {
        Ok(self.frames.clone())
    }
}

/// Generates a deterministic athlete for every video.
#[derive(Debug, Clone)]
pub struct SyntheticPoseSource {
    frame_count: usize,
}

impl SyntheticPoseSource {
    pub fn new(frame_count: usize) -> Self {
        Self { frame_count }
    }
}

#[async_trait]
impl PoseSource for SyntheticPoseSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn extract(&self, _video: &Path) -> Result<Vec<PoseFrame>> {
        Ok(formlab_analysis::synthetic::frames(self.frame_count))
    }
}

/// Reads landmarks from a `.pose.json` file next to the video.
#[derive(Debug, Clone, Default)]
pub struct JsonFilePoseSource;

impl JsonFilePoseSource {
    /// `clip.mp4` -> `clip.pose.json`.
    pub fn sidecar_path(video: &Path) -> PathBuf {
        video.with_extension("pose.json")
    }
}

#[async_trait]
impl PoseSource for JsonFilePoseSource {
    fn name(&self) -> &'static str {
        "json_sidecar"
    }

    async fn extract(&self, video: &Path) -> Result<Vec<PoseFrame>> {
        let sidecar = Self::sidecar_path(video);
        let bytes = tokio::fs::read(&sidecar).await.map_err(|e| {
            Error::Extractor(format!(
                "Cannot read pose sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })?;
        let frames = parse_pose_json(&bytes)?;
        debug!(frame_count = frames.len(), "Loaded pose sidecar");
        Ok(frames)
    }
}

/// Spawns an external estimator with the video path as its last argument
/// and parses the JSON it prints on stdout.
#[derive(Debug, Clone)]
pub struct CommandPoseSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPoseSource {
    /// Build from a command line such as `"pose-estimate --model lite"`.
    pub fn from_command_line(command: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("POSE_COMMAND is empty".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }
}

/// Run a command and return its stdout, bounded by `timeout`.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Vec<u8>> {
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            Error::Extractor(format!(
                "Pose estimator timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| Error::Extractor(format!("Failed to execute pose estimator: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extractor(format!(
            "Pose estimator failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

#[async_trait]
impl PoseSource for CommandPoseSource {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn extract(&self, video: &Path) -> Result<Vec<PoseFrame>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(video).kill_on_drop(true);
        let stdout = run_cmd_with_timeout(&mut cmd, self.timeout).await?;
        parse_pose_json(&stdout)
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Which pose source to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseSourceKind {
    Sidecar,
    Command(String),
    Synthetic,
}

/// Configuration for the pose source.
#[derive(Debug, Clone)]
pub struct PoseSourceConfig {
    pub kind: PoseSourceKind,
    pub timeout: Duration,
    /// Frames produced by the synthetic source.
    pub synthetic_frames: usize,
}

impl Default for PoseSourceConfig {
    fn default() -> Self {
        Self {
            kind: PoseSourceKind::Sidecar,
            timeout: Duration::from_secs(defaults::POSE_TIMEOUT_SECS),
            synthetic_frames: 60,
        }
    }
}

impl PoseSourceConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `POSE_SOURCE` | `sidecar` | `sidecar`, `command` or `synthetic` |
    /// | `POSE_COMMAND` | unset | Estimator command line; selects `command` when set |
    /// | `POSE_TIMEOUT_SECS` | `300` | Estimator timeout |
    /// | `POSE_SYNTHETIC_FRAMES` | `60` | Frames per synthetic video |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let command = std::env::var("POSE_COMMAND")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let requested = std::env::var("POSE_SOURCE")
            .ok()
            .map(|v| v.trim().to_ascii_lowercase());

        let kind = match (requested.as_deref(), command) {
            (Some("synthetic"), _) => PoseSourceKind::Synthetic,
            (Some("sidecar"), _) => PoseSourceKind::Sidecar,
            (_, Some(command)) => PoseSourceKind::Command(command),
            _ => PoseSourceKind::Sidecar,
        };

        let timeout = std::env::var("POSE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let synthetic_frames = std::env::var("POSE_SYNTHETIC_FRAMES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.synthetic_frames);

        Self {
            kind,
            timeout,
            synthetic_frames,
        }
    }

    pub fn with_kind(mut self, kind: PoseSourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the configured source.
    pub fn build(&self) -> Result<Arc<dyn PoseSource>> {
        Ok(match &self.kind {
            PoseSourceKind::Sidecar => Arc::new(JsonFilePoseSource),
            PoseSourceKind::Command(command) => {
                Arc::new(CommandPoseSource::from_command_line(command, self.timeout)?)
            }
            PoseSourceKind::Synthetic => Arc::new(SyntheticPoseSource::new(self.synthetic_frames)),
        })
    }
}
