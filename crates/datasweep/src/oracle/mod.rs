//! External decision oracles.
//!
//! An [`Oracle`] is a text-generation service the delegated planner and
//! validator consult over a request/response boundary. Oracle failures are
//! never fatal: callers catch them and fail over to their rule-based
//! counterparts.

#[cfg(feature = "ai")]
mod openai;

#[cfg(feature = "ai")]
pub use openai::{OpenAiConfig, OpenAiConfigBuilder, OpenAiOracle};

use crate::error::Result;

/// A delegated decision-maker reached over request/response.
///
/// Implementations are expected to bound each call with a timeout; a call
/// that errors or times out makes the caller fall back to rules.
pub trait Oracle: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send one prompt and return the raw text reply.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Pull the JSON payload out of an oracle reply.
///
/// Accepts a bare JSON document, a reply wrapped in ```json fences, or JSON
/// embedded in surrounding prose (first `{` to last `}`).
pub(crate) fn extract_json(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();

    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(fence_end) = body.find("```") {
            let inner = body[..fence_end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_bare() {
        assert_eq!(extract_json(r#"{"score": 8}"#), Some(r#"{"score": 8}"#));
    }

    #[test]
    fn test_extract_json_fenced() {
        let reply = "Here is the plan:\n```json\n{\"steps\": []}\n```\nDone.";
        assert_eq!(extract_json(reply), Some("{\"steps\": []}"));
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let reply = "Sure! The result is {\"score\": 5, \"feedback\": \"ok\"} as requested.";
        assert_eq!(
            extract_json(reply),
            Some("{\"score\": 5, \"feedback\": \"ok\"}")
        );
    }

    #[test]
    fn test_extract_json_none_when_no_json() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json(""), None);
    }
}
