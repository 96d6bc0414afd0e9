use serde_json::Value;

use crate::errors::AiServiceError;

/// Remove a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line, if any.
    let body = match rest.find('\n') {
        Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[idx + 1..]
        }
        _ => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Decode collaborator output as JSON, tolerating a markdown fence around it.
pub fn parse_json_response(text: &str) -> Result<Value, AiServiceError> {
    let body = strip_json_fences(text);
    if body.is_empty() {
        return Err(AiServiceError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|err| AiServiceError::InvalidJson(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_tagged_fence() {
        let text = "```json\n{\"summary\": \"short\"}\n```";
        assert_eq!(strip_json_fences(text), "{\"summary\": \"short\"}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_json_fences("```\n[1, 2]\n```  "), "[1, 2]");
    }

    #[test]
    fn leaves_plain_json_alone() {
        assert_eq!(strip_json_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn parses_fenced_json() {
        let value = parse_json_response("```json\n{\"keyThemes\": [\"a\"]}\n```").unwrap();
        assert_eq!(value, json!({"keyThemes": ["a"]}));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            parse_json_response("Sure! Here is the summary."),
            Err(AiServiceError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_json_response("```json\n```"),
            Err(AiServiceError::EmptyResponse)
        ));
    }
}
