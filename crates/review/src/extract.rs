//! Recover a `ReviewResult` from raw model output
//!
//! Cleaning and parsing are separate steps: `clean_response` is a pure
//! text-to-candidate function, `extract` parses the candidate strictly.

use crate::error::ExtractionError;
use crate::types::ReviewResult;

/// Fenced block delimiter.
const FENCE: &str = "```";

/// Reduce raw model output to the text most likely to be the JSON object.
///
/// - Fenced output: split on the fence, keep the first segment containing both
///   `{` and `}`, drop a leading language tag (`json`, `JSON`, ...).
/// - Unfenced output: slice from the first `{` to the last `}`, dropping any
///   prose before or after the object.
/// - Otherwise the trimmed text is returned as-is.
pub fn clean_response(raw: &str) -> &str {
    let trimmed = raw.trim();

    if trimmed.contains(FENCE) {
        let segment = trimmed
            .split(FENCE)
            .find(|segment| looks_like_object(segment))
            .unwrap_or(trimmed);
        return strip_language_tag(segment).trim();
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return &trimmed[start..=end];
    }

    trimmed
}

/// Parse raw model output into a `ReviewResult`.
///
/// Any syntax or shape error yields `ExtractionError`, never a partial result.
pub fn extract(raw: &str) -> Result<ReviewResult, ExtractionError> {
    serde_json::from_str(clean_response(raw)).map_err(|source| ExtractionError {
        raw: raw.to_string(),
        source,
    })
}

fn looks_like_object(segment: &str) -> bool {
    segment.contains('{') && segment.contains('}')
}

/// Drop a bare word directly after the opening fence (`json\n{...}`).
fn strip_language_tag(segment: &str) -> &str {
    let tag_len = segment
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'))
        .unwrap_or(segment.len());
    if tag_len == 0 {
        return segment;
    }
    let rest = &segment[tag_len..];
    if rest.starts_with(char::is_whitespace) || rest.starts_with('{') {
        rest
    } else {
        segment
    }
}
