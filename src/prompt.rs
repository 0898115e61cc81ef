use log::debug;

/// Longest transcript (in characters) embedded into a prompt
pub const MAX_TRANSCRIPT_CHARS: usize = 80_000;

pub const SYSTEM_PROMPT: &str = "Return ONLY valid JSON. No markdown, no explanations, no extra text.";

const INSTRUCTIONS: &str = r#"Return ONLY valid JSON with this exact structure:

{
  "summary": "3-sentence summary of main points",
  "propaganda_score": 4.5,
  "score_reasoning": "Brief explanation (0=factual, 10=manipulative)",
  "factual_errors": [{"statement": "claim", "correction": "fact", "why_wrong": "reason"}],
  "logical_errors": [{"fallacy": "ad hominem", "quote": "text", "explanation": "brief"}],
  "controversial_statements": [{"statement": "text", "context": "balanced view"}]
}

Transcript: "#;

/// Cut `text` to at most `max` characters, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the analysis prompt for a transcript.
///
/// Transcripts over `MAX_TRANSCRIPT_CHARS` are truncated silently; the
/// instruction block is always kept whole.
pub fn build_prompt(transcript: &str) -> String {
    let body = truncate_chars(transcript, MAX_TRANSCRIPT_CHARS);
    if body.len() < transcript.len() {
        debug!(
            "Transcript truncated to {MAX_TRANSCRIPT_CHARS} chars (was {})",
            transcript.chars().count()
        );
    }
    format!("{INSTRUCTIONS}{body}")
}
