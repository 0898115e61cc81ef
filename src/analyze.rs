use std::sync::Arc;

use log::{info, warn};

use crate::analysis::AnalysisResult;
use crate::error::AnalyzeError;
use crate::extract_video_id;
use crate::inference::{Completion, InferenceError};
use crate::normalize::normalize_output;
use crate::prompt::build_prompt;
use crate::youtube::TranscriptFetcher;

/// Transcripts shorter than this (in characters) are not worth analyzing
pub const MIN_TRANSCRIPT_CHARS: usize = 50;

/// Runs one analysis request end to end: URL, video ID, transcript, prompt,
/// model, result. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Analyzer {
    transcripts: TranscriptFetcher,
    inference: Arc<dyn Completion>,
}

impl Analyzer {
    pub fn new(transcripts: TranscriptFetcher, inference: Arc<dyn Completion>) -> Self {
        Self { transcripts, inference }
    }

    pub fn model(&self) -> &str {
        self.inference.model()
    }

    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult, AnalyzeError> {
        let video_id = extract_video_id(url)?;
        info!("Analyzing video {video_id}");

        let transcript = self
            .transcripts
            .fetch(&video_id)
            .await
            .map_err(|_| AnalyzeError::TranscriptUnavailable)?;

        let chars = transcript.chars().count();
        if chars < MIN_TRANSCRIPT_CHARS {
            warn!("Transcript for {video_id} too short ({chars} chars)");
            return Err(AnalyzeError::TranscriptUnavailable);
        }
        info!("Transcript for {video_id}: {chars} chars");

        let prompt = build_prompt(&transcript);

        match self.inference.complete(&prompt).await {
            Ok(output) => Ok(normalize_output(&output)),
            Err(e @ InferenceError::NotConfigured) => Err(AnalyzeError::internal(e.to_string())),
            Err(e) => {
                warn!("Inference for {video_id} failed: {e}");
                Ok(AnalysisResult::failed(e.to_string()))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::analysis::COLLECTION_FIELDS;
    use crate::inference::RawOutput;
    use crate::prompt::MAX_TRANSCRIPT_CHARS;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[tokio::test]
    async fn test_analyze_success() {
        let model = FakeModel::message(MODEL_JSON);
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), model.clone());
        let result = a.analyze(URL).await.unwrap();
        let expected: serde_json::Value = serde_json::from_str(MODEL_JSON).unwrap();
        assert_eq!(result.into_value(), expected);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with(TRANSCRIPT));
    }

    #[tokio::test]
    async fn test_analyze_invalid_url_skips_upstream() {
        let model = FakeModel::message(MODEL_JSON);
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), model.clone());
        assert!(matches!(a.analyze("not a url").await, Err(AnalyzeError::InvalidUrl)));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_no_captions() {
        let a = analyzer(FakeCaptions::none(), FakeModel::message(MODEL_JSON));
        assert!(matches!(a.analyze(URL).await, Err(AnalyzeError::TranscriptUnavailable)));
    }

    #[tokio::test]
    async fn test_analyze_short_transcript() {
        let a = analyzer(FakeCaptions::with("too short"), FakeModel::message(MODEL_JSON));
        assert!(matches!(a.analyze(URL).await, Err(AnalyzeError::TranscriptUnavailable)));
    }

    #[tokio::test]
    async fn test_analyze_upstream_status_is_absorbed() {
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), FakeModel::replying(Reply::Status(503)));
        let result = a.analyze(URL).await.unwrap();
        assert_eq!(result.error(), Some("API error 503: Service Unavailable"));
        assert_eq!(result.propaganda_score(), Some(0.0));
        for field in COLLECTION_FIELDS {
            assert!(result.get(field).is_some(), "{field}");
        }
    }

    #[tokio::test]
    async fn test_analyze_unreachable_is_absorbed() {
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), FakeModel::replying(Reply::Unreachable));
        let result = a.analyze(URL).await.unwrap();
        assert!(result.error().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_analyze_missing_credential_escalates() {
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), FakeModel::replying(Reply::NotConfigured));
        assert!(matches!(a.analyze(URL).await, Err(AnalyzeError::Internal(_))));
    }

    #[tokio::test]
    async fn test_analyze_envelope_gives_raw_response() {
        let model = FakeModel::replying(Reply::Output(RawOutput::Envelope(r#"{"id":"x"}"#.to_string())));
        let a = analyzer(FakeCaptions::with(TRANSCRIPT), model);
        let result = a.analyze(URL).await.unwrap();
        assert_eq!(result.raw_response(), Some(r#"{"id":"x"}"#));
    }

    #[tokio::test]
    async fn test_analyze_truncates_long_transcript() {
        let long = "word ".repeat(MAX_TRANSCRIPT_CHARS / 2);
        let model = FakeModel::message(MODEL_JSON);
        let a = analyzer(FakeCaptions::with(&long), model.clone());
        a.analyze(URL).await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        let body = prompts[0].split("Transcript: ").nth(1).unwrap();
        assert_eq!(body.chars().count(), MAX_TRANSCRIPT_CHARS);
    }
}
