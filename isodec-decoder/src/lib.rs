//! isodec Message Decoder
//!
//! This crate decodes ISO 8583 message lines: header validation, bitmap
//! decoding, the bitmap-driven field walk and batch orchestration.

pub mod batch;
pub mod bitmap;
pub mod field_walker;
pub mod header;
pub mod message_parser;

pub use batch::{decode_batch, BatchOptions, BatchPolicy, BatchReport, LineFailure, ParsedLine};
pub use bitmap::Bitmap;
pub use field_walker::extract_field;
pub use header::{validate_header, HeaderValidator};
pub use message_parser::{parse_line, MessageParser};
