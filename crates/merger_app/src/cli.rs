use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::logging::LogDestination;

/// Merge the video files of a directory into one video.
#[derive(Parser, Debug)]
#[command(name = "video_merger", version, about, long_about = None)]
pub struct Args {
    /// Directory containing video files to merge
    #[arg(long)]
    pub dir: PathBuf,

    /// Filename for the merged output video
    #[arg(long)]
    pub output: PathBuf,

    /// RON config file (defaults to ./video_merger.ron when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Order names with digit runs compared numerically (clip2 before clip10)
    #[arg(long)]
    pub natural_sort: bool,

    /// Copy streams instead of re-encoding
    #[arg(long)]
    pub copy: bool,

    /// Fail the merge if it runs longer than this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Maximum number of files read at once
    #[arg(long)]
    pub max_reads: Option<usize>,

    /// Also write a JSON manifest next to the output
    #[arg(long)]
    pub manifest: bool,
}

impl Args {
    pub fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}
