//! Compact Binary Rule Format
//!
//! A schema-versioned byte encoding of rule ASTs, meant for caching parsed
//! filter lists and shipping them across process boundaries.
//!
//! # Architecture
//!
//! - `format`: magic, schema version, node type tags and field tags
//! - `frequent`: per-field tables of common strings written as one byte
//! - `serializer`: AST → bytes
//! - `deserializer`: bytes → AST, rejecting other schema versions up front
//!
//! Preserved source text (`raws`) is not encoded. Decoding what was encoded
//! yields an equal tree once raws are cleared.

pub mod format;
pub mod frequent;
mod deserializer;
mod serializer;

pub use deserializer::{decode_varint, deserialize_rule, deserialize_rules, read_header, BinaryInfo};
pub use format::{BINARY_MAGIC, BINARY_SCHEMA_VERSION, HEADER_SIZE};
pub use serializer::{serialize_rule, serialize_rules};

/// Error raised while encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("Too many {field}: {count} (max {max})")]
    TooManyItems {
        field: &'static str,
        count: usize,
        max: usize,
    },
    #[error("String too long: {0} bytes")]
    StringTooLong(usize),
}

/// Error raised while decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeserializeError {
    #[error("Invalid magic bytes")]
    InvalidMagic,
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: u16, found: u16 },
    #[error("Unexpected end of data at offset {0}")]
    UnexpectedEof(usize),
    #[error("Unknown node type {tag:#04x} at offset {offset}")]
    UnknownNodeType { tag: u8, offset: usize },
    #[error("Expected {expected}, found {found} at offset {offset}")]
    UnexpectedNodeType {
        expected: &'static str,
        found: &'static str,
        offset: usize,
    },
    #[error("Unknown field tag {tag:#04x} in {node}")]
    UnknownField { node: &'static str, tag: u8 },
    #[error("Missing field '{field}' in {node}")]
    MissingField {
        node: &'static str,
        field: &'static str,
    },
    #[error("Invalid UTF-8 at offset {0}")]
    InvalidUtf8(usize),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("{0} trailing bytes after last node")]
    TrailingBytes(usize),
}
