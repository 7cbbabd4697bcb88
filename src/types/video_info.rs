use serde::{Deserialize, Serialize};

/// Metadata for a loaded video, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub uploader: String,
    /// Human-readable duration for display ("12:34").
    pub duration: String,
    pub duration_seconds: f64,
    /// Thumbnail image URL; may be empty when the source has none.
    pub thumbnail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Video,
    Audio,
}

impl FormatType {
    pub fn label(&self) -> &'static str {
        match self {
            FormatType::Video => "Video",
            FormatType::Audio => "Audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Best,
    #[serde(rename = "1080")]
    P1080,
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "480")]
    P480,
    #[serde(rename = "360")]
    P360,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::Best,
        Quality::P1080,
        Quality::P720,
        Quality::P480,
        Quality::P360,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Best => "Best Available",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
        }
    }

    fn max_height(&self) -> Option<u32> {
        match self {
            Quality::Best => None,
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
        }
    }

    /// yt-dlp `-f` selector for this quality and format type.
    pub fn format_selector(&self, format_type: FormatType) -> String {
        match format_type {
            FormatType::Audio => "bestaudio/best".to_string(),
            FormatType::Video => match self.max_height() {
                None => "bestvideo+bestaudio/best".to_string(),
                Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
            },
        }
    }
}
