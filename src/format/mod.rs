//! Content-type dispatch for loaded maps
//!
//! Each supported content type maps to a [`Format`]: a decoder plus the
//! editability of documents it produces. Documents decoded from JSON can be
//! saved back without loss and are editable; documents imported from foreign
//! formats are read-only because a round trip cannot be guaranteed.

pub mod freemind;
pub mod json;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::document::Document;
use crate::core::error::DecodeError;
use crate::source::{LoadedMap, MapProperties};

/// Native MindMup JSON
pub const JSON: &str = "application/json";
/// Unlabelled binary content, treated as JSON
pub const OCTET_STREAM: &str = "application/octet-stream";
/// FreeMind `.mm` markup
pub const FREEMIND: &str = "application/x-freemind";
/// Marker for maps that live in a collaborative session
pub const COLLAB: &str = "application/vnd.mindmup.collab";

/// Content as handed over by a storage backend
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    /// Serialized text still to be parsed
    Text(String),
    /// A value the backend already parsed
    Structured(Value),
}

impl From<String> for RawContent {
    fn from(text: String) -> Self {
        RawContent::Text(text)
    }
}

impl From<&str> for RawContent {
    fn from(text: &str) -> Self {
        RawContent::Text(text.to_string())
    }
}

impl From<Value> for RawContent {
    fn from(value: Value) -> Self {
        RawContent::Structured(value)
    }
}

/// A map as loaded by a storage backend, before decoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawMap {
    pub content: RawContent,
    pub map_id: String,
    pub content_type: String,
    /// Extra properties the backend attaches to the loaded map
    pub properties: Map<String, Value>,
}

impl RawMap {
    pub fn new(
        content: impl Into<RawContent>,
        map_id: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            map_id: map_id.into(),
            content_type: content_type.into(),
            properties: Map::new(),
        }
    }

    /// Attach backend-specific properties
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

/// Decoder turning raw content for a map id into a document
pub type Decoder = Arc<dyn Fn(RawContent, &str) -> Result<Document, DecodeError> + Send + Sync>;

/// A decodable content type
#[derive(Clone)]
pub struct Format {
    /// Whether documents from this format may be edited and saved back
    pub editable: bool,
    pub decoder: Decoder,
}

impl Format {
    pub fn new(
        editable: bool,
        decoder: impl Fn(RawContent, &str) -> Result<Document, DecodeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            editable,
            decoder: Arc::new(decoder),
        }
    }
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format")
            .field("editable", &self.editable)
            .finish_non_exhaustive()
    }
}

fn unsupported(raw: &RawMap) -> DecodeError {
    DecodeError::unsupported(raw.content_type.clone())
}

/// Registry of formats keyed by content type
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Format>,
    fallback: fn(&RawMap) -> DecodeError,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(JSON, Format::new(true, json::decode));
        registry.register(OCTET_STREAM, Format::new(true, json::decode));
        registry.register(FREEMIND, Format::new(false, freemind::decode));
        registry.register(
            COLLAB,
            Format::new(false, |_, map_id: &str| Err(DecodeError::redirect(map_id))),
        );
        registry
    }
}

impl FormatRegistry {
    /// Create a registry with no formats
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
            fallback: unsupported,
        }
    }

    /// Add or replace the format for a content type
    pub fn register(&mut self, content_type: impl Into<String>, format: Format) -> &mut Self {
        self.formats.insert(content_type.into(), format);
        self
    }

    /// Replace the error produced for content types with no format
    pub fn set_fallback(&mut self, fallback: fn(&RawMap) -> DecodeError) -> &mut Self {
        self.fallback = fallback;
        self
    }

    /// Check whether a content type has a registered format
    pub fn supports(&self, content_type: &str) -> bool {
        self.formats.contains_key(content_type)
    }

    /// Get the registered content types
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Decode a loaded map according to its content type
    pub fn decode(&self, raw: RawMap) -> Result<LoadedMap, DecodeError> {
        let Some(format) = self.formats.get(&raw.content_type) else {
            tracing::warn!("No decoder for content type {}", raw.content_type);
            return Err((self.fallback)(&raw));
        };

        tracing::debug!(
            "Decoding map {} as {} (editable: {})",
            raw.map_id,
            raw.content_type,
            format.editable
        );

        let document = (format.decoder)(raw.content, &raw.map_id)?;
        Ok(LoadedMap {
            document,
            map_id: raw.map_id,
            properties: MapProperties {
                editable: format.editable,
                extra: raw.properties,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_registry_content_types() {
        let registry = FormatRegistry::default();
        for content_type in [JSON, OCTET_STREAM, FREEMIND, COLLAB] {
            assert!(registry.supports(content_type), "{content_type}");
        }
        assert!(!registry.supports("application/JSON"));
        assert!(!registry.supports("application/json; charset=utf-8"));
        assert_eq!(registry.content_types().count(), 4);
    }

    #[test]
    fn test_json_is_editable() {
        let registry = FormatRegistry::default();
        let loaded = registry
            .decode(RawMap::new(r#"{"id":1,"title":"X"}"#, "abc", OCTET_STREAM))
            .unwrap();
        assert_eq!(loaded.document.as_value(), &json!({"id": 1, "title": "X"}));
        assert_eq!(loaded.map_id, "abc");
        assert!(loaded.properties.editable);
    }

    #[test]
    fn test_freemind_is_read_only() {
        let registry = FormatRegistry::default();
        let loaded = registry
            .decode(RawMap::new("<map><node TEXT=\"X\"/></map>", "abc", FREEMIND))
            .unwrap();
        assert!(!loaded.properties.editable);
    }

    #[test]
    fn test_collab_redirects() {
        let registry = FormatRegistry::default();
        let err = registry
            .decode(RawMap::new(json!(null), "abc", COLLAB))
            .unwrap_err();
        assert_eq!(err, DecodeError::redirect("abc"));
    }

    #[test]
    fn test_unknown_content_type_uses_fallback() {
        let registry = FormatRegistry::default();
        let err = registry
            .decode(RawMap::new("", "abc", "application/x-unsupported"))
            .unwrap_err();
        assert_eq!(err.message(), "Unsupported format application/x-unsupported");
    }

    #[test]
    fn test_custom_fallback() {
        let mut registry = FormatRegistry::default();
        registry.set_fallback(|raw| DecodeError::redirect(&raw.map_id));

        let err = registry
            .decode(RawMap::new("", "abc", "application/x-unsupported"))
            .unwrap_err();
        assert_eq!(err, DecodeError::redirect("abc"));
        assert!(registry.decode(RawMap::new("{}", "abc", JSON)).is_ok());
    }

    #[test]
    fn test_register_custom_format() {
        let mut registry = FormatRegistry::empty();
        assert!(!registry.supports(JSON));

        registry.register(
            "text/plain",
            Format::new(false, |content, _: &str| match content {
                RawContent::Text(text) => Ok(Document::new(json!({ "title": text }))),
                RawContent::Structured(_) => Err(DecodeError::Format),
            }),
        );
        let loaded = registry
            .decode(RawMap::new("hello", "abc", "text/plain"))
            .unwrap();
        assert_eq!(loaded.document.title(), Some("hello"));
        assert!(!loaded.properties.editable);
    }

    #[test]
    fn test_backend_properties_are_kept() {
        let registry = FormatRegistry::default();
        let mut properties = Map::new();
        properties.insert("editable".to_string(), json!(true));
        properties.insert("owner".to_string(), json!("someone"));

        let loaded = registry
            .decode(
                RawMap::new("<map><node TEXT=\"X\"/></map>", "abc", FREEMIND)
                    .with_properties(properties),
            )
            .unwrap();
        assert!(!loaded.properties.editable);
        assert_eq!(loaded.properties.extra.get("owner"), Some(&json!("someone")));
    }
}
