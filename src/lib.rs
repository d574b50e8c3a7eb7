//! Mapsource - format-normalizing adapter for mind map storage backends
//!
//! A storage backend loads and saves serialized maps. [`FileSystemMapSource`]
//! wraps one and turns whatever the backend delivers (native JSON, FreeMind
//! markup, or a pointer to a collaborative session) into a [`Document`],
//! while passing the backend's progress and errors through untouched.

pub mod core;
pub mod format;
pub mod operation;
pub mod source;

pub use crate::core::config::AdapterConfig;
pub use crate::core::document::Document;
pub use crate::core::error::{AdapterError, DecodeError, ErrorKind};
pub use format::{FormatRegistry, RawContent, RawMap};
pub use operation::{Deferred, Operation, OperationEvent, Progress};
pub use source::{FileSystemMapSource, LoadedMap, MapProperties, MapSource};
