//! In-memory map documents and their canonical on-disk encoding

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Title used when a document does not carry one
pub const UNTITLED: &str = "Untitled";

/// A mind map document
///
/// The content is treated as an opaque JSON value. Only the top-level
/// `title` field is interpreted, to derive a file name on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    /// Wrap an already structured value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    /// Get the document title, if it has a string one
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// Get the document title or the placeholder for untitled maps
    pub fn title_or_untitled(&self) -> &str {
        self.title().unwrap_or(UNTITLED)
    }

    /// Borrow the underlying value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the underlying value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Encode the document as indented JSON text
    ///
    /// Keys keep their insertion order, so a document loaded from text and
    /// saved again produces a stable, diffable file.
    pub fn to_canonical_json(&self, indent: usize) -> serde_json::Result<String> {
        let indent = " ".repeat(indent);
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.0.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.0
    }
}
