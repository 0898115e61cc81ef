pub mod analysis;
pub mod analyze;
pub mod config;
pub mod error;
pub mod inference;
pub mod normalize;
pub mod prompt;
pub mod server;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

pub use analysis::AnalysisResult;
pub use analyze::Analyzer;
pub use error::AnalyzeError;

/// A single captioned segment
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start: f64,
}

/// Caption track for a video
#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Flatten all segments into one space-joined string, in time order
    pub fn text(&self) -> String {
        let mut segments: Vec<&Segment> = self.segments.iter().collect();
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

// Ordered: the first pattern that matches wins.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"watch\?(?:.*&)?v=([0-9A-Za-z_-]{11})",
        r"embed/([0-9A-Za-z_-]{11})",
        r"youtu\.be/([0-9A-Za-z_-]{11})",
        r"shorts/([0-9A-Za-z_-]{11})",
        r"(?:v=|/)([0-9A-Za-z_-]{11})",
        r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static video id pattern"))
    .collect()
});

/// Extract the 11-character video ID from a YouTube URL (or a bare ID)
pub fn extract_video_id(input: &str) -> Result<String, AnalyzeError> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
        .ok_or(AnalyzeError::InvalidUrl)
}
