//! Storage backends and the format adapter that wraps them

pub mod file_system;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::document::Document;
use crate::format::RawMap;
use crate::operation::Operation;

pub use file_system::FileSystemMapSource;

/// Capabilities a storage backend offers to the adapter
///
/// Backends deal in serialized content only; decoding and encoding maps is
/// left to [`FileSystemMapSource`].
pub trait MapSource {
    /// Error payload reported on the failure channel
    type Error: Send + 'static;

    /// Value reported when a save succeeds, such as a new map id
    type Saved: Send + 'static;

    /// Start loading the map with the given id
    fn load_map(&self, map_id: &str) -> Operation<RawMap, Self::Error>;

    /// Start saving serialized content under a file name
    fn save_map(
        &self,
        content: String,
        map_id: &str,
        file_name: &str,
        overwrite: Option<bool>,
    ) -> Operation<Self::Saved, Self::Error>;

    /// Check whether a map id belongs to this backend
    fn recognises(&self, map_id: &str) -> bool;

    /// Get a human-readable label for the backend
    fn description(&self) -> String;

    /// Whether maps from this backend are kept out of collaboration features
    fn not_sharable(&self) -> bool {
        false
    }
}

impl<S: MapSource + ?Sized> MapSource for Arc<S> {
    type Error = S::Error;
    type Saved = S::Saved;

    fn load_map(&self, map_id: &str) -> Operation<RawMap, Self::Error> {
        (**self).load_map(map_id)
    }

    fn save_map(
        &self,
        content: String,
        map_id: &str,
        file_name: &str,
        overwrite: Option<bool>,
    ) -> Operation<Self::Saved, Self::Error> {
        (**self).save_map(content, map_id, file_name, overwrite)
    }

    fn recognises(&self, map_id: &str) -> bool {
        (**self).recognises(map_id)
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn not_sharable(&self) -> bool {
        (**self).not_sharable()
    }
}

impl<S: MapSource + ?Sized> MapSource for &S {
    type Error = S::Error;
    type Saved = S::Saved;

    fn load_map(&self, map_id: &str) -> Operation<RawMap, Self::Error> {
        (**self).load_map(map_id)
    }

    fn save_map(
        &self,
        content: String,
        map_id: &str,
        file_name: &str,
        overwrite: Option<bool>,
    ) -> Operation<Self::Saved, Self::Error> {
        (**self).save_map(content, map_id, file_name, overwrite)
    }

    fn recognises(&self, map_id: &str) -> bool {
        (**self).recognises(map_id)
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn not_sharable(&self) -> bool {
        (**self).not_sharable()
    }
}

/// Properties of a loaded map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapProperties {
    /// Whether the map can be edited and saved back in its own format
    pub editable: bool,
    /// Extra properties supplied by the backend
    pub extra: Map<String, Value>,
}

/// A decoded map, ready for the editor
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub document: Document,
    pub map_id: String,
    pub properties: MapProperties,
}
