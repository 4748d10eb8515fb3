//! isodec Schema Loader
//!
//! This crate turns field definition files into an immutable
//! `FieldDefinitionRegistry` shared by every message parse.

pub mod line_parser;
pub mod registry;

pub use line_parser::{parse_definition_line, split_schema_fields};
pub use registry::{DuplicateIdPolicy, FieldDefinitionRegistry, SchemaFileError};
