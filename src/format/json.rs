//! Native JSON maps

use super::RawContent;
use crate::core::document::Document;
use crate::core::error::DecodeError;

/// Decode a JSON map, accepting content the backend already parsed
pub fn decode(content: RawContent, map_id: &str) -> Result<Document, DecodeError> {
    match content {
        RawContent::Structured(value) => Ok(Document::new(value)),
        RawContent::Text(text) => Document::from_json(&text).map_err(|e| {
            tracing::warn!("Map {} is not valid JSON: {}", map_id, e);
            DecodeError::Format
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BAD_CONTENT_MESSAGE;
    use serde_json::json;

    #[test]
    fn test_decode_text() {
        let doc = decode(RawContent::from(r#"{"id": 1, "title": "X"}"#), "abc").unwrap();
        assert_eq!(doc.as_value(), &json!({"id": 1, "title": "X"}));
    }

    #[test]
    fn test_structured_content_is_used_as_is() {
        let value = json!({"id": 1, "title": "X", "ideas": {"1": {"title": "Y"}}});
        let doc = decode(RawContent::Structured(value.clone()), "abc").unwrap();
        assert_eq!(doc.into_value(), value);
    }

    #[test]
    fn test_markup_is_a_format_error() {
        let err = decode(RawContent::from(r#"<xml>{id: 1, title: "X"}</xml>"#), "abc").unwrap_err();
        assert_eq!(err, DecodeError::Format);
        assert_eq!(err.message(), BAD_CONTENT_MESSAGE);
    }

    #[test]
    fn test_empty_text_is_a_format_error() {
        assert_eq!(decode(RawContent::from(""), "abc"), Err(DecodeError::Format));
    }
}
