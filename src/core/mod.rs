//! Core types: documents, configuration, and errors

pub mod config;
pub mod document;
pub mod error;
