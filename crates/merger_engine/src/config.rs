use std::time::Duration;

use merger_core::NameOrder;
use serde::{Deserialize, Serialize};

use crate::FfmpegSettings;

pub const DEFAULT_ARTIFACT_NAME: &str = "merged_video.mp4";
pub const DEFAULT_ARTIFACT_MEDIA_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NameOrderSetting {
    #[default]
    Lexicographic,
    Natural,
}

impl From<NameOrderSetting> for NameOrder {
    fn from(setting: NameOrderSetting) -> Self {
        match setting {
            NameOrderSetting::Lexicographic => NameOrder::Lexicographic,
            NameOrderSetting::Natural => NameOrder::Natural,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergerConfig {
    pub max_concurrent_reads: usize,
    pub merge_timeout_ms: Option<u64>,
    pub artifact_name: String,
    pub artifact_media_type: String,
    pub name_order: NameOrderSetting,
    pub ffmpeg: FfmpegSettings,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: 4,
            merge_timeout_ms: None,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            artifact_media_type: DEFAULT_ARTIFACT_MEDIA_TYPE.to_string(),
            name_order: NameOrderSetting::default(),
            ffmpeg: FfmpegSettings::default(),
        }
    }
}

impl MergerConfig {
    pub fn merge_timeout(&self) -> Option<Duration> {
        self.merge_timeout_ms.map(Duration::from_millis)
    }

    pub fn name_order(&self) -> NameOrder {
        self.name_order.into()
    }
}
