//! Audit prompt construction

/// Language hint used when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "Auto-detect";

/// Build the audit prompt for `code`.
///
/// Asks for bugs, performance and complexity issues, and security classes such
/// as injection and XSS, and for a single bare JSON object in the
/// `ReviewResult` shape.
pub fn build_review_prompt(code: &str, language: &str) -> String {
    let language = match language.trim() {
        "" => DEFAULT_LANGUAGE,
        other => other,
    };
    format!(
        r#"Act as an autonomous code reviewer. Audit the following {language} code.

---
{code}
---

Check for:
1. Bugs: syntax errors, logic errors, unhandled edge cases.
2. Performance: inefficient algorithms, needless allocations, poor time or space complexity.
3. Security: injection (SQL, command), cross-site scripting (XSS), unsafe deserialization, hard-coded secrets.

Respond with ONLY a valid JSON object. Do not use markdown code fences and do not add any text before or after the object.

Required JSON structure:
{{
  "optimized_code": "the full corrected and cleaned-up code",
  "quality_score": 85,
  "errors": ["syntax or logic bugs"],
  "inefficiencies": ["performance or complexity issues"],
  "security": ["vulnerabilities such as SQL injection or XSS"]
}}
"#
    )
}
