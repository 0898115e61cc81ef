use serde::Serialize;
use serde_json::{Map, Value, json};

pub const SUMMARY: &str = "summary";
pub const PROPAGANDA_SCORE: &str = "propaganda_score";
pub const SCORE_REASONING: &str = "score_reasoning";
pub const FACTUAL_ERRORS: &str = "factual_errors";
pub const LOGICAL_ERRORS: &str = "logical_errors";
pub const CONTROVERSIAL_STATEMENTS: &str = "controversial_statements";
pub const ERROR: &str = "error";
pub const RAW_RESPONSE: &str = "raw_response";

pub const COLLECTION_FIELDS: [&str; 3] = [FACTUAL_ERRORS, LOGICAL_ERRORS, CONTROVERSIAL_STATEMENTS];

pub const NO_REASONING: &str = "No reasoning provided";

/// The analysis returned to callers.
///
/// Model output is kept as a JSON object so keys the model adds beyond the
/// expected schema survive the trip back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult(Map<String, Value>);

impl AnalysisResult {
    /// Wrap a parsed model object, filling in any expected field it lacks.
    /// Fields already present are left exactly as the model returned them.
    pub fn from_model_object(mut obj: Map<String, Value>) -> Self {
        for field in COLLECTION_FIELDS {
            obj.entry(field).or_insert_with(|| json!([]));
        }
        obj.entry(SCORE_REASONING).or_insert_with(|| json!(NO_REASONING));
        obj.entry(SUMMARY).or_insert_with(|| json!(""));
        obj.entry(PROPAGANDA_SCORE).or_insert_with(|| json!(0));
        Self(obj)
    }

    /// Result for a model response that could not be parsed.
    /// Keeps the first 1000 characters of the raw text for diagnosis.
    pub fn unparsed(raw: &str) -> Self {
        let excerpt: String = raw.chars().take(1000).collect();
        let mut result = Self::zeroed("Analysis complete (JSON parse failed)");
        result.0.insert(SCORE_REASONING.into(), json!(NO_REASONING));
        result.0.insert(RAW_RESPONSE.into(), json!(excerpt));
        result
    }

    /// Result for a pipeline stage that failed before any analysis existed
    pub fn failed(error: impl Into<String>) -> Self {
        let mut result = Self::zeroed("");
        result.0.insert(ERROR.into(), json!(error.into()));
        result
    }

    fn zeroed(summary: &str) -> Self {
        let mut obj = Map::new();
        obj.insert(SUMMARY.into(), json!(summary));
        obj.insert(PROPAGANDA_SCORE.into(), json!(0));
        obj.insert(SCORE_REASONING.into(), json!(""));
        for field in COLLECTION_FIELDS {
            obj.insert(field.into(), json!([]));
        }
        Self(obj)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn summary(&self) -> Option<&str> {
        self.0.get(SUMMARY).and_then(Value::as_str)
    }

    pub fn propaganda_score(&self) -> Option<f64> {
        self.0.get(PROPAGANDA_SCORE).and_then(Value::as_f64)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get(ERROR).and_then(Value::as_str)
    }

    pub fn raw_response(&self) -> Option<&str> {
        self.0.get(RAW_RESPONSE).and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
