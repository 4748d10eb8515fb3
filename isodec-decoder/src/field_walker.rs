//! 字段提取模块
//!
//! 根据字段定义从消息行的当前位置提取单个字段，支持定长字段与带十进制长度前缀的变长字段

use isodec_core::utils::char_slice;
use isodec_core::{ParsedField, ProtocolError, ProtocolResult};
use isodec_schema::FieldDefinitionRegistry;
use tracing::debug;

/// 提取单个字段
///
/// # 参数
/// - `field_number`: 字段编号（位图中的位编号）
/// - `line`: 完整的消息行
/// - `pointer`: 当前字符偏移
/// - `registry`: 字段定义注册表
///
/// # 返回
/// - `Ok((ParsedField, usize))`: 字段值与越过该字段后的字符偏移
/// - `Err(ProtocolError::UnknownFieldDefinition)`: 字段没有定义
/// - `Err(ProtocolError::InvalidLengthPrefix)`: 长度前缀不是十进制数字
/// - `Err(ProtocolError::MessageTooShort)`: 读取越过行尾
/// - `Err(ProtocolError::PatternMismatch)`: 字段值不满足校验模式
///
/// # 示例
/// ```
/// use isodec_decoder::extract_field;
/// use isodec_schema::FieldDefinitionRegistry;
///
/// let registry =
///     FieldDefinitionRegistry::load("2,PAN,^[0-9]{1,19}$,19,1,1,Primary Account Number").unwrap();
/// let (field, pointer) = extract_field(2, "06123456", 0, &registry).unwrap();
/// assert_eq!(field.value, "123456");
/// assert_eq!(field.length, 6);
/// assert_eq!(pointer, 8);
/// ```
pub fn extract_field(
    field_number: u16,
    line: &str,
    pointer: usize,
    registry: &FieldDefinitionRegistry,
) -> ProtocolResult<(ParsedField, usize)> {
    let definition = registry
        .get(field_number)
        .ok_or(ProtocolError::UnknownFieldDefinition(field_number))?;

    let mut pointer = pointer;

    let effective_length = if definition.is_variable_length {
        let digits = definition.length_digit_count();
        let prefix = read_chars(line, pointer, digits)?;
        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProtocolError::InvalidLengthPrefix {
                field: field_number,
                prefix: prefix.to_string(),
            });
        }
        pointer += digits;
        prefix
            .parse::<usize>()
            .map_err(|_| ProtocolError::InvalidLengthPrefix {
                field: field_number,
                prefix: prefix.to_string(),
            })?
    } else {
        definition.fixed_length
    };

    let value = read_chars(line, pointer, effective_length)?;
    pointer += effective_length;

    debug!(
        field = field_number,
        length = effective_length,
        value,
        "field extracted"
    );

    if !definition.accepts(value) {
        return Err(ProtocolError::PatternMismatch {
            field: field_number,
            value: value.to_string(),
        });
    }

    Ok((
        ParsedField {
            field_number,
            label: definition.label.clone(),
            length: effective_length,
            value: value.to_string(),
        },
        pointer,
    ))
}

/// 读取指定数量的字符，越过行尾时报告长度不足
fn read_chars(line: &str, start: usize, count: usize) -> ProtocolResult<&str> {
    char_slice(line, start, count).ok_or_else(|| ProtocolError::MessageTooShort {
        needed: start.saturating_add(count),
        actual: line.chars().count(),
    })
}
