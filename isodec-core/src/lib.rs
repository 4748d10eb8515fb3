//! isodec Core Library
//!
//! This crate provides the core data structures shared by the isodec
//! workspace: field definitions, decoded field records and the error type.

pub mod error;
pub mod field_meta;
pub mod utils;

// 导出错误类型
pub use error::{ProtocolError, ProtocolResult};

// 导出字段元数据类型，便于其他模块使用
pub use field_meta::*;

/// 消息头固定长度（字符数）
pub const HEADER_LEN: usize = 32;

/// 携带二级位图时消息的最小长度（字符数）
pub const SECONDARY_BITMAP_END: usize = 48;

/// 单个位图的十六进制字符数
pub const BITMAP_HEX_LEN: usize = 16;
