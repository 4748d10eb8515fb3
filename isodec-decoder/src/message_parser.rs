//! 消息解析核心实现
//!
//! 依次执行消息头校验、位图解码和按位图逐字段提取，得到一行消息的全部字段。
//! 任一步骤失败即终止该行解析，已提取的字段全部丢弃。

use isodec_core::utils::{char_slice, hex_to_binary};
use isodec_core::{
    ParsedMessage, ProtocolError, ProtocolResult, BITMAP_HEX_LEN, HEADER_LEN,
    SECONDARY_BITMAP_END,
};
use isodec_schema::FieldDefinitionRegistry;
use tracing::debug;

use crate::bitmap::Bitmap;
use crate::field_walker::extract_field;
use crate::header::HeaderValidator;

/// 消息解析器
///
/// 只持有注册表的共享引用，可在多个线程中同时使用
#[derive(Debug, Clone, Copy)]
pub struct MessageParser<'r> {
    registry: &'r FieldDefinitionRegistry,
}

impl<'r> MessageParser<'r> {
    pub fn new(registry: &'r FieldDefinitionRegistry) -> Self {
        Self { registry }
    }

    /// 解析一行消息
    ///
    /// # 参数
    /// - `line`: 消息行文本
    ///
    /// # 返回
    /// - `Ok(ParsedMessage)`: 按字段编号升序排列的字段
    /// - `Err(ProtocolError)`: 第一个出错步骤的错误
    pub fn parse_line(&self, line: &str) -> ProtocolResult<ParsedMessage> {
        let header = HeaderValidator::validate(line)?;
        debug!(
            base_header = %header.base_header,
            message_type = %header.message_type,
            primary_bitmap = %header.primary_bitmap,
            "header validated"
        );

        let mut pointer = HEADER_LEN;
        let secondary_hex = if Bitmap::secondary_flag(&header.primary_bitmap) {
            let secondary = char_slice(line, HEADER_LEN, BITMAP_HEX_LEN).ok_or_else(|| {
                ProtocolError::MessageTooShort {
                    needed: SECONDARY_BITMAP_END,
                    actual: line.chars().count(),
                }
            })?;
            pointer = SECONDARY_BITMAP_END;
            Some(secondary)
        } else {
            None
        };

        let bitmap = Bitmap::decode(&header.primary_bitmap, secondary_hex)?;
        debug!(
            primary = %hex_to_binary(&header.primary_bitmap).unwrap_or_default(),
            secondary = %secondary_hex.and_then(hex_to_binary).unwrap_or_default(),
            "bitmap decoded"
        );

        let mut fields = Vec::new();
        for field_number in bitmap.field_numbers() {
            let (field, next) = extract_field(field_number, line, pointer, self.registry)?;
            fields.push(field);
            pointer = next;
        }

        let remaining = line.chars().count().saturating_sub(pointer);
        if remaining > 0 {
            debug!(remaining, "characters left after last field");
        }

        Ok(ParsedMessage {
            header,
            secondary_bitmap: secondary_hex.map(str::to_string),
            fields,
        })
    }
}

/// 使用给定注册表解析一行消息
pub fn parse_line(line: &str, registry: &FieldDefinitionRegistry) -> ProtocolResult<ParsedMessage> {
    MessageParser::new(registry).parse_line(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FieldDefinitionRegistry {
        FieldDefinitionRegistry::load(
            "\
2,PAN,^[0-9]{1,19}$,19,1,1,Primary Account Number
3,PROC,^[0-9]{6}$,6,0,1,Processing Code
4,AMOUNT,^[0-9]{12}$,12,0,1,Amount
70,NETCODE,^[0-9]{3}$,3,0,1,Network Management Code
",
        )
        .unwrap()
    }

    fn message(message_type: &str, bitmaps: &str, body: &str) -> String {
        format!("ISO026000050{message_type}{bitmaps}{body}")
    }

    #[test]
    fn test_parse_primary_bitmap_message() {
        let registry = registry();
        // 7 = 0111 -> 字段2、3、4
        let line = message(
            "0200",
            "7000000000000000",
            "164111111111111111000000000000001000",
        );
        let message = parse_line(&line, &registry).unwrap();

        assert_eq!(message.header.message_type, "0200");
        assert_eq!(message.secondary_bitmap, None);
        let numbers: Vec<u16> = message.fields.iter().map(|f| f.field_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
        assert_eq!(message.fields[0].value, "4111111111111111");
        assert_eq!(message.fields[0].length, 16);
        assert_eq!(message.fields[1].value, "000000");
        assert_eq!(message.fields[2].value, "000000001000");
        assert_eq!(
            message.field(3).map(|f| f.label.as_str()),
            Some("Processing Code")
        );
    }

    #[test]
    fn test_parse_secondary_bitmap_message() {
        let registry = registry();
        // 主位图第1位置位；二级位图 04 -> 第70位
        let line = message("0800", "80000000000000000400000000000000", "301");
        let message = MessageParser::new(&registry).parse_line(&line).unwrap();

        assert_eq!(
            message.secondary_bitmap.as_deref(),
            Some("0400000000000000")
        );
        assert_eq!(message.fields.len(), 1);
        assert_eq!(message.fields[0].field_number, 70);
        assert_eq!(message.fields[0].value, "301");
    }

    #[test]
    fn test_secondary_bitmap_missing() {
        let registry = registry();
        let line = message("0800", "8000000000000000", "0400");
        let err = parse_line(&line, &registry).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MessageTooShort {
                needed: 48,
                actual: 36
            }
        );
    }

    #[test]
    fn test_error_discards_line() {
        let registry = registry();
        // 字段2正确，字段3不是数字
        let line = message("0200", "6000000000000000", "164111111111111111ABCDEF");
        let err = parse_line(&line, &registry).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PatternMismatch {
                field: 3,
                value: "ABCDEF".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_field_in_bitmap() {
        let registry = registry();
        // 08 -> 字段5，没有定义
        let line = message("0200", "0800000000000000", "000000000000");
        let err = parse_line(&line, &registry).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownFieldDefinition(5));
    }

    #[test]
    fn test_empty_bitmap_and_trailing_data() {
        let registry = registry();
        let line = message("0200", "0000000000000000", "trailing");
        let message = parse_line(&line, &registry).unwrap();
        assert!(message.fields.is_empty());
        assert_eq!(message.header.primary_bitmap, "0000000000000000");
    }
}
