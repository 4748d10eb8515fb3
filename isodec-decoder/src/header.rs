//! 消息头校验模块
//!
//! 校验并拆分固定32字符的消息头：
//! `ISO` + 9位十进制数字 + 4字符消息类型 + 16位十六进制主位图

use isodec_core::utils::char_slice;
use isodec_core::{MessageHeader, ProtocolError, ProtocolResult, HEADER_LEN};
use nom::{
    bytes::complete::{tag, take, take_while_m_n},
    combinator::all_consuming,
    sequence::{preceded, tuple},
    IResult,
};

/// 消息头校验器
pub struct HeaderValidator;

impl HeaderValidator {
    /// 校验消息头
    ///
    /// # 参数
    /// - `line`: 完整的消息行
    ///
    /// # 返回
    /// - `Ok(MessageHeader)`: 拆分后的消息头
    /// - `Err(ProtocolError::MessageTooShort)`: 不足32字符
    /// - `Err(ProtocolError::InvalidHeader)`: 前32字符格式不符
    pub fn validate(line: &str) -> ProtocolResult<MessageHeader> {
        let header = char_slice(line, 0, HEADER_LEN).ok_or_else(|| {
            ProtocolError::MessageTooShort {
                needed: HEADER_LEN,
                actual: line.chars().count(),
            }
        })?;

        let (_, (base_header, message_type, primary_bitmap)) =
            header_parts(header).map_err(|_| ProtocolError::InvalidHeader(header.to_string()))?;

        Ok(MessageHeader {
            base_header: base_header.to_string(),
            message_type: message_type.to_string(),
            primary_bitmap: primary_bitmap.to_string(),
        })
    }
}

/// 校验消息头，等价于 `HeaderValidator::validate`
pub fn validate_header(line: &str) -> ProtocolResult<MessageHeader> {
    HeaderValidator::validate(line)
}

fn header_parts(input: &str) -> IResult<&str, (&str, &str, &str)> {
    all_consuming(preceded(
        tag("ISO"),
        tuple((
            take_while_m_n(9, 9, |c: char| c.is_ascii_digit()),
            take(4usize),
            take_while_m_n(16, 16, |c: char| c.is_ascii_hexdigit()),
        )),
    ))(input)
}
