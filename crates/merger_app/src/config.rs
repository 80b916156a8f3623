use std::fs;
use std::path::{Path, PathBuf};

use merger_engine::{CodecMode, MergerConfig, NameOrderSetting};
use merger_logging::{merger_info, merger_warn};

use crate::cli::Args;

const DEFAULT_CONFIG_FILENAME: &str = "video_merger.ron";

/// Reads the RON config; any problem falls back to defaults.
///
/// A missing file is only worth a warning when the path was given explicitly.
pub(crate) fn load(explicit: Option<&Path>) -> MergerConfig {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            return MergerConfig::default();
        }
        Err(err) => {
            merger_warn!("Failed to read config from {:?}: {}", path, err);
            return MergerConfig::default();
        }
    };

    match parse(&content) {
        Ok(config) => {
            merger_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            merger_warn!("Failed to parse config from {:?}: {}", path, err);
            MergerConfig::default()
        }
    }
}

pub(crate) fn parse(content: &str) -> Result<MergerConfig, ron::error::SpannedError> {
    ron::from_str(content)
}

/// Command-line flags win over file values.
pub(crate) fn apply_args(config: &mut MergerConfig, args: &Args) {
    if args.natural_sort {
        config.name_order = NameOrderSetting::Natural;
    }
    if args.copy {
        config.ffmpeg.mode = CodecMode::StreamCopy;
    }
    if let Some(secs) = args.timeout_secs {
        config.merge_timeout_ms = Some(secs.saturating_mul(1000));
    }
    if let Some(binary) = &args.ffmpeg {
        config.ffmpeg.binary = Some(binary.clone());
    }
    if let Some(max_reads) = args.max_reads {
        config.max_concurrent_reads = max_reads.max(1);
    }
}
