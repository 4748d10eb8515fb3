//! 协议错误定义

use thiserror::Error;

pub type ProtocolResult<T, E = ProtocolError> = Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 字段定义文件格式错误
    #[error("Schema format error on line {line}: {reason}")]
    SchemaFormat { line: usize, reason: String },
    /// 消息长度不足
    #[error("Message too short: need {needed} characters, got {actual}")]
    MessageTooShort { needed: usize, actual: usize },
    /// 消息头格式错误
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// 二级位图格式错误
    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),
    /// 位图中的字段没有对应定义
    #[error("Field definition {0} not found")]
    UnknownFieldDefinition(u16),
    /// 变长字段的长度前缀不是十进制数字
    #[error("Field {field} has an invalid length prefix '{prefix}'")]
    InvalidLengthPrefix { field: u16, prefix: String },
    /// 字段值不满足校验模式
    #[error("Field {field} does not match its pattern: '{value}'")]
    PatternMismatch { field: u16, value: String },
}

impl ProtocolError {
    /// 错误类别名称，用于结构化输出
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::SchemaFormat { .. } => "SchemaFormatError",
            ProtocolError::MessageTooShort { .. } => "MessageTooShort",
            ProtocolError::InvalidHeader(_) => "InvalidHeader",
            ProtocolError::InvalidBitmap(_) => "InvalidBitmap",
            ProtocolError::UnknownFieldDefinition(_) => "UnknownFieldDefinition",
            ProtocolError::InvalidLengthPrefix { .. } => "InvalidLengthPrefix",
            ProtocolError::PatternMismatch { .. } => "PatternMismatch",
        }
    }

    /// 出错字段编号（如果错误与具体字段相关）
    pub fn field_number(&self) -> Option<u16> {
        match self {
            ProtocolError::UnknownFieldDefinition(field)
            | ProtocolError::InvalidLengthPrefix { field, .. }
            | ProtocolError::PatternMismatch { field, .. } => Some(*field),
            _ => None,
        }
    }
}
