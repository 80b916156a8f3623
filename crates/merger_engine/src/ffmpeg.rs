use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use merger_logging::{merger_debug, merger_info, merger_warn};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;

use crate::{CodecEngine, EngineFailure, MergeEngine, MergeProgress, MergeRequest};

const STAGING_SHARE: f64 = 40.0;
const RUN_START: f64 = 50.0;
const RUN_END: f64 = 95.0;
const STDERR_TAIL_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodecMode {
    /// Re-encode to H.264/AAC so inputs with differing codecs still concatenate.
    #[default]
    Reencode,
    /// Copy streams as-is; inputs must share codec parameters.
    StreamCopy,
}

impl CodecMode {
    fn args(self) -> &'static [&'static str] {
        match self {
            CodecMode::Reencode => &["-c:v", "libx264", "-c:a", "aac", "-strict", "-2"],
            CodecMode::StreamCopy => &["-c", "copy"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegSettings {
    pub binary: Option<PathBuf>,
    pub mode: CodecMode,
}

impl FfmpegSettings {
    /// Explicit binary, else an ffmpeg next to the working directory, else `PATH`.
    pub fn resolve_binary(&self) -> PathBuf {
        if let Some(binary) = &self.binary {
            return binary.clone();
        }
        let name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
        if let Ok(cwd) = std::env::current_dir() {
            let local = cwd.join(name);
            if local.is_file() {
                return local;
            }
        }
        PathBuf::from(name)
    }
}

/// ffmpeg binary as codec engine. The version probe runs once.
#[derive(Debug)]
pub struct FfmpegCodec {
    binary: PathBuf,
    probe: OnceCell<Result<String, String>>,
}

impl FfmpegCodec {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            probe: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &FfmpegSettings) -> Self {
        Self::new(settings.resolve_binary())
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn version(&self) -> Option<&str> {
        match self.probe.get() {
            Some(Ok(version)) => Some(version.as_str()),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl CodecEngine for FfmpegCodec {
    fn is_ready(&self) -> bool {
        matches!(self.probe.get(), Some(Ok(_)))
    }

    async fn when_ready(&self) -> Result<(), EngineFailure> {
        let probe = self
            .probe
            .get_or_init(|| probe_version(&self.binary))
            .await;
        match probe {
            Ok(_) => Ok(()),
            Err(reason) => Err(EngineFailure::NotLoaded(reason.clone())),
        }
    }
}

async fn probe_version(binary: &Path) -> Result<String, String> {
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|err| format!("cannot run {}: {err}", binary.display()))?;
    if !output.status.success() {
        return Err(format!("{} -version exited with {}", binary.display(), output.status));
    }
    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    merger_info!("ffmpeg ready: {}", version);
    Ok(version)
}

/// Concatenates inputs with ffmpeg's concat demuxer.
pub struct FfmpegConcatEngine {
    codec: Arc<FfmpegCodec>,
    mode: CodecMode,
}

impl FfmpegConcatEngine {
    pub fn new(codec: Arc<FfmpegCodec>, mode: CodecMode) -> Self {
        Self { codec, mode }
    }

    fn command(&self, list: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(self.codec.binary());
        cmd.args(["-hide_banner", "-nostdin", "-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(list)
            .args(self.mode.args())
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl MergeEngine for FfmpegConcatEngine {
    fn entry_point_available(&self) -> bool {
        self.codec.is_ready()
    }

    async fn when_ready(&self) -> Result<(), EngineFailure> {
        self.codec.when_ready().await
    }

    async fn merge(
        &self,
        request: MergeRequest,
        progress: &dyn MergeProgress,
        cancel: CancellationToken,
    ) -> Result<Bytes, EngineFailure> {
        if request.is_empty() {
            return Err(EngineFailure::Rejected("no inputs".to_string()));
        }
        let staging = tempfile::Builder::new().prefix("video_merger").tempdir()?;

        let total = request.len();
        let mut list = String::new();
        for (index, (name, bytes)) in request.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(EngineFailure::Cancelled);
            }
            let path = staging.path().join(staged_name(index, name));
            tokio::fs::write(&path, bytes).await?;
            list.push_str(&concat_entry(&path));
            progress.report(STAGING_SHARE * (index + 1) as f64 / total as f64);
        }
        // Inputs live on disk from here on.
        drop(request);

        let list_path = staging.path().join("inputs.txt");
        tokio::fs::write(&list_path, list).await?;
        let output_path = staging.path().join("merged.mp4");

        let mut child = self.command(&list_path, &output_path).spawn()?;
        progress.report(RUN_START);
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineFailure::Rejected("ffmpeg stderr unavailable".to_string()))?;
        // ffmpeg separates status updates with '\r', log lines with '\n'.
        let mut frames = FramedRead::new(stderr, AnyDelimiterCodec::new(b"\r\n".to_vec(), Vec::new()));

        let mut tracker = OutputProgress::default();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    merger_warn!("ffmpeg killed on cancellation");
                    return Err(EngineFailure::Cancelled);
                }
                frame = frames.next() => match frame {
                    Some(Ok(chunk)) => {
                        let line = String::from_utf8_lossy(&chunk);
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        merger_debug!("ffmpeg: {}", line);
                        if let Some(fraction) = tracker.observe(line) {
                            progress.report(RUN_START + (RUN_END - RUN_START) * fraction);
                        }
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line.to_string());
                    }
                    Some(Err(err)) => {
                        return Err(EngineFailure::Rejected(format!("reading ffmpeg output: {err}")));
                    }
                    None => break,
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => None,
            status = child.wait() => Some(status?),
        };
        let Some(status) = status else {
            let _ = child.kill().await;
            return Err(EngineFailure::Cancelled);
        };
        if !status.success() {
            let detail = tail.into_iter().collect::<Vec<_>>().join("\n");
            return Err(EngineFailure::Rejected(format!(
                "ffmpeg exited with {status}: {detail}"
            )));
        }
        progress.report(RUN_END);

        let merged = tokio::fs::read(&output_path).await?;
        Ok(Bytes::from(merged))
    }
}

fn staged_name(index: usize, name: &str) -> String {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    format!("input_{index:05}.{ext}")
}

fn concat_entry(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', r"'\''");
    format!("file '{escaped}'\n")
}

/// Derives a completion fraction from `Duration:` and `time=` stderr lines.
#[derive(Debug, Default)]
struct OutputProgress {
    total_secs: Option<f64>,
}

impl OutputProgress {
    fn observe(&mut self, line: &str) -> Option<f64> {
        if self.total_secs.is_none() {
            if let Some((_, rest)) = line.split_once("Duration: ") {
                let stamp = rest.split(',').next().unwrap_or(rest).trim();
                self.total_secs = parse_timestamp(stamp).filter(|secs| *secs > 0.0);
            }
        }
        let (_, rest) = line.split_once("time=")?;
        let elapsed = parse_timestamp(rest.split_whitespace().next()?)?;
        let total = self.total_secs?;
        Some((elapsed / total).clamp(0.0, 1.0))
    }
}

/// Parses `HH:MM:SS(.frac)`; `N/A` and negative stamps yield `None`.
fn parse_timestamp(stamp: &str) -> Option<f64> {
    let mut parts = stamp.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ffmpeg_timestamps() {
        assert_eq!(parse_timestamp("00:01:02.50"), Some(62.5));
        assert_eq!(parse_timestamp("01:00:00"), Some(3600.0));
        assert_eq!(parse_timestamp("N/A"), None);
        assert_eq!(parse_timestamp("-577014:32:22.77"), None);
        assert_eq!(parse_timestamp("00:00"), None);
    }

    #[test]
    fn progress_needs_duration_before_time() {
        let mut tracker = OutputProgress::default();
        assert_eq!(tracker.observe("frame=1 time=00:00:01.00 bitrate=1k"), None);
        assert_eq!(
            tracker.observe("  Duration: 00:00:10.00, start: 0.000000, bitrate: 900 kb/s"),
            None
        );
        assert_eq!(tracker.observe("frame=50 time=00:00:05.00 bitrate=1k"), Some(0.5));
        assert_eq!(tracker.observe("frame=99 time=00:00:30.00 bitrate=1k"), Some(1.0));
    }

    #[test]
    fn unknown_duration_yields_no_fraction() {
        let mut tracker = OutputProgress::default();
        tracker.observe("  Duration: N/A, start: 0.000000, bitrate: N/A");
        assert_eq!(tracker.observe("time=00:00:05.00"), None);
    }

    #[test]
    fn staged_names_keep_safe_extensions() {
        assert_eq!(staged_name(0, "a.mp4"), "input_00000.mp4");
        assert_eq!(staged_name(12, "weird name's.mov"), "input_00012.mov");
        assert_eq!(staged_name(3, "no_extension"), "input_00003.bin");
        assert_eq!(staged_name(4, "bad.ext!"), "input_00004.bin");
    }

    #[test]
    fn concat_entries_escape_single_quotes() {
        let entry = concat_entry(Path::new("/tmp/it's/input.mp4"));
        assert_eq!(entry, "file '/tmp/it'\\''s/input.mp4'\n");
    }

    #[test]
    fn binary_setting_wins() {
        let settings = FfmpegSettings {
            binary: Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")),
            mode: CodecMode::StreamCopy,
        };
        assert_eq!(settings.resolve_binary(), PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(CodecMode::StreamCopy.args(), &["-c", "copy"]);
    }
}
