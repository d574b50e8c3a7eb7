//! Format adapter over a file-like storage backend
//!
//! The backend moves serialized content around; this adapter decides what
//! that content means. Loaded content is dispatched on its content type to
//! a decoder and tagged editable or read-only. Saved documents are encoded
//! as indented JSON under a file name derived from the map title.

use std::sync::Arc;

use super::{LoadedMap, MapSource};
use crate::core::config::AdapterConfig;
use crate::core::document::Document;
use crate::core::error::AdapterError;
use crate::format::FormatRegistry;
use crate::operation::Operation;

/// Adapter that decodes and encodes maps for a storage backend
#[derive(Debug, Clone)]
pub struct FileSystemMapSource<B> {
    backend: B,
    config: AdapterConfig,
    formats: Arc<FormatRegistry>,
}

impl<B: MapSource> FileSystemMapSource<B> {
    /// Wrap a backend with the default configuration and formats
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, AdapterConfig::default())
    }

    /// Wrap a backend with custom configuration and the default formats
    pub fn with_config(backend: B, config: AdapterConfig) -> Self {
        Self::with_registry(backend, config, FormatRegistry::default())
    }

    /// Wrap a backend with custom configuration and formats
    pub fn with_registry(backend: B, config: AdapterConfig, formats: FormatRegistry) -> Self {
        Self {
            backend,
            config,
            formats: Arc::new(formats),
        }
    }

    /// Get the wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the adapter configuration
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Get the formats loaded maps are decoded with
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Load and decode a map
    ///
    /// Backend progress and failures come through untouched. Content is
    /// decoded once the backend delivers it.
    pub fn load_map(&self, map_id: &str) -> Operation<LoadedMap, AdapterError<B::Error>> {
        tracing::debug!("Loading map {} from {}", map_id, self.backend.description());

        let formats = Arc::clone(&self.formats);
        self.backend.load_map(map_id).map_outcome(move |result| {
            let raw = result.map_err(AdapterError::Backend)?;
            formats.decode(raw).map_err(|e| {
                tracing::debug!("Map load failed with {}: {}", e.reason(), e.message());
                AdapterError::Decode(e)
            })
        })
    }

    /// Encode a map and hand it to the backend for saving
    ///
    /// The file name is the map title plus the configured extension. The
    /// overwrite flag is passed to the backend unchanged.
    pub fn save_map(
        &self,
        document: &Document,
        map_id: &str,
        overwrite: Option<bool>,
    ) -> Operation<B::Saved, AdapterError<B::Error>> {
        let content = match document.to_canonical_json(self.config.indent) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to encode map {}: {}", map_id, e);
                return Operation::rejected(AdapterError::Encode(e));
            }
        };
        let file_name = self.config.file_name_for(document.title_or_untitled());

        tracing::info!("Saving map {} as {}", map_id, file_name);
        self.backend
            .save_map(content, map_id, &file_name, overwrite)
            .map_err(AdapterError::Backend)
    }

    /// Check whether the backend claims a map id
    pub fn recognises(&self, map_id: &str) -> bool {
        self.backend.recognises(map_id)
    }

    /// Get the backend's current description
    pub fn description(&self) -> String {
        self.backend.description()
    }

    /// Whether the backend keeps its maps out of collaboration
    pub fn not_sharable(&self) -> bool {
        self.backend.not_sharable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::UNTITLED;
    use crate::format::{Format, RawContent, RawMap, JSON};
    use serde_json::json;
    use std::sync::Mutex;

    /// Backend that serves one fixed map and records saves
    #[derive(Default)]
    struct StaticBackend {
        content: Option<RawMap>,
        saved: Mutex<Vec<(String, String, String, Option<bool>)>>,
    }

    impl MapSource for StaticBackend {
        type Error = String;
        type Saved = String;

        fn load_map(&self, map_id: &str) -> Operation<RawMap, String> {
            match &self.content {
                Some(raw) => Operation::resolved(RawMap {
                    map_id: map_id.to_string(),
                    ..raw.clone()
                }),
                None => Operation::rejected(format!("no map {map_id}")),
            }
        }

        fn save_map(
            &self,
            content: String,
            map_id: &str,
            file_name: &str,
            overwrite: Option<bool>,
        ) -> Operation<String, String> {
            self.saved.lock().unwrap().push((
                content,
                map_id.to_string(),
                file_name.to_string(),
                overwrite,
            ));
            Operation::resolved(map_id.to_string())
        }

        fn recognises(&self, _map_id: &str) -> bool {
            true
        }

        fn description(&self) -> String {
            "static".to_string()
        }
    }

    #[tokio::test]
    async fn test_custom_extension_and_indent() {
        let config = AdapterConfig {
            file_extension: "json".to_string(),
            indent: 4,
        };
        let source = FileSystemMapSource::with_config(StaticBackend::default(), config);
        let saved = source
            .save_map(&Document::new(json!({"title": "abc"})), "id", None)
            .settle(|_| {})
            .await;
        assert_eq!(saved.unwrap().unwrap(), "id");

        let calls = source.backend().saved.lock().unwrap();
        assert_eq!(calls[0].0, "{\n    \"title\": \"abc\"\n}");
        assert_eq!(calls[0].2, "abc.json");
        assert_eq!(calls[0].3, None);
    }

    #[tokio::test]
    async fn test_untitled_map_file_name() {
        let source = FileSystemMapSource::new(StaticBackend::default());
        source
            .save_map(&Document::new(json!("abc")), "id", Some(false))
            .settle(|_| {})
            .await;

        let calls = source.backend().saved.lock().unwrap();
        assert_eq!(calls[0].0, "\"abc\"");
        assert_eq!(calls[0].2, format!("{UNTITLED}.mup"));
        assert_eq!(calls[0].3, Some(false));
    }

    #[tokio::test]
    async fn test_custom_registry() {
        let mut formats = FormatRegistry::empty();
        formats.register(
            JSON,
            Format::new(false, |content, _: &str| match content {
                RawContent::Structured(value) => Ok(Document::new(value)),
                RawContent::Text(_) => Ok(Document::new(json!({"title": "text"}))),
            }),
        );
        let backend = StaticBackend {
            content: Some(RawMap::new("{}", "", JSON)),
            ..Default::default()
        };
        let source = FileSystemMapSource::with_registry(backend, AdapterConfig::default(), formats);

        let loaded = source.load_map("abc").settle(|_| {}).await.unwrap().unwrap();
        assert_eq!(loaded.document.title(), Some("text"));
        assert_eq!(loaded.map_id, "abc");
        assert!(!loaded.properties.editable);
    }

    #[tokio::test]
    async fn test_backend_rejection_is_wrapped_verbatim() {
        let source = FileSystemMapSource::new(StaticBackend::default());
        let err = source.load_map("abc").settle(|_| {}).await.unwrap().unwrap_err();
        assert_eq!(err.into_backend(), Some("no map abc".to_string()));
    }
}
