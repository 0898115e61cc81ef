use log::{debug, warn};
use serde_json::Value;

use crate::analysis::AnalysisResult;
use crate::inference::RawOutput;

/// Markers models wrap JSON in despite being told not to, longest first
const FENCE_MARKERS: [&str; 3] = ["```json", "```", "json"];

/// Strip code-fence markers from either end of `raw`.
///
/// Each end is handled on its own, so an opening fence without a closing one
/// (or the reverse) is still removed. Stripping is repeated until nothing
/// changes, which makes the function idempotent.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    loop {
        let before = text.len();
        for marker in FENCE_MARKERS {
            if let Some(rest) = text.strip_prefix(marker) {
                text = rest.trim_start();
            }
            if let Some(rest) = text.strip_suffix(marker) {
                text = rest.trim_end();
            }
        }
        if text.len() == before {
            return text;
        }
    }
}

/// Turn raw model output into an `AnalysisResult`. Never fails.
pub fn normalize(raw: &str) -> AnalysisResult {
    let text = strip_fences(raw);

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => {
            debug!("Model output parsed ({} keys)", obj.len());
            AnalysisResult::from_model_object(obj)
        }
        Ok(other) => {
            warn!("Model output is JSON but not an object: {}", type_name(&other));
            AnalysisResult::unparsed(text)
        }
        Err(e) => {
            warn!("Model output is not valid JSON: {e}");
            AnalysisResult::unparsed(text)
        }
    }
}

/// Normalize whatever the inference client returned.
///
/// An envelope without a model message is never the expected schema, so it
/// goes straight to the raw-response fallback instead of being parsed.
pub fn normalize_output(output: &RawOutput) -> AnalysisResult {
    match output {
        RawOutput::Message(text) => normalize(text),
        RawOutput::Envelope(body) => {
            warn!("Completion envelope had no message content, returning raw body");
            AnalysisResult::unparsed(body)
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{COLLECTION_FIELDS, NO_REASONING, SCORE_REASONING};
    use serde_json::json;

    const WELL_FORMED: &str = r#"{
  "summary": "A speech about taxes.",
  "propaganda_score": 4.5,
  "score_reasoning": "Some loaded framing",
  "factual_errors": [{"statement": "claim", "correction": "fact", "why_wrong": "reason"}],
  "logical_errors": [{"fallacy": "ad hominem", "quote": "text", "explanation": "brief"}],
  "controversial_statements": [{"statement": "text", "context": "balanced view"}]
}"#;

    fn assert_collections_present(r: &AnalysisResult) {
        for field in COLLECTION_FIELDS {
            assert!(r.get(field).is_some_and(Value::is_array), "missing {field}");
        }
    }

    #[test]
    fn test_strip_fences_full() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_no_fence() {
        assert_eq!(strip_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_opening_only() {
        assert_eq!(strip_fences("```json {\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_closing_only() {
        assert_eq!(strip_fences("{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_bare_json_tag() {
        assert_eq!(strip_fences("json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_fence_only() {
        assert_eq!(strip_fences("```json\n```"), "");
        assert_eq!(strip_fences("```"), "");
    }

    #[test]
    fn test_strip_fences_idempotent() {
        for input in ["```json\n{\"a\": 1}\n```", "{\"a\": 1}", "``` ```json [1]", ""] {
            let once = strip_fences(input);
            assert_eq!(strip_fences(once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_normalize_well_formed_round_trip() {
        let r = normalize(WELL_FORMED);
        let expected: Value = serde_json::from_str(WELL_FORMED).unwrap();
        assert_eq!(r.into_value(), expected);
    }

    #[test]
    fn test_normalize_fenced() {
        let fenced = format!("```json\n{WELL_FORMED}\n```");
        let r = normalize(&fenced);
        assert_eq!(r.summary(), Some("A speech about taxes."));
        assert_eq!(r.propaganda_score(), Some(4.5));
        assert!(r.raw_response().is_none());
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let r = normalize(r#"{"summary": "short", "propaganda_score": 2}"#);
        assert_collections_present(&r);
        assert_eq!(r.get(SCORE_REASONING), Some(&json!(NO_REASONING)));
        assert_eq!(r.propaganda_score(), Some(2.0));
    }

    #[test]
    fn test_normalize_invalid_json() {
        let r = normalize("Sorry, I cannot analyze this video.");
        assert_collections_present(&r);
        assert_eq!(r.propaganda_score(), Some(0.0));
        assert_eq!(r.raw_response(), Some("Sorry, I cannot analyze this video."));
    }

    #[test]
    fn test_normalize_non_object_json() {
        let r = normalize("[1, 2, 3]");
        assert_collections_present(&r);
        assert_eq!(r.raw_response(), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_normalize_is_total() {
        let inputs = ["", "```", "null", "42", "\"json\"", "{", "{}", "```json\n{\"summary\": 1}"];
        for input in inputs {
            let r = normalize(input);
            assert_collections_present(&r);
        }
    }

    #[test]
    fn test_normalize_output_message() {
        let r = normalize_output(&RawOutput::Message(format!("```{WELL_FORMED}```")));
        assert_eq!(r.propaganda_score(), Some(4.5));
    }

    #[test]
    fn test_normalize_output_envelope_falls_back() {
        let envelope = json!({"id": "abc", "object": "chat.completion"}).to_string();
        let r = normalize_output(&RawOutput::Envelope(envelope.clone()));
        assert_collections_present(&r);
        assert!(r.get("id").is_none());
        assert_eq!(r.raw_response(), Some(envelope.as_str()));
    }
}
