//! 定义行解析模块
//!
//! 解析 `id,name,regex,len,variableFlag,numericFlag[,label]` 格式的字段定义行

use isodec_core::{FieldDefinition, FieldPattern, ProtocolError, ProtocolResult};

/// 按逗号拆分定义行
///
/// 括号（`{}` `()`）内部、正则字符类 `[...]` 内部或反斜杠转义的逗号不作为分隔符，
/// 使 `{1,19}` 这类量词可以出现在正则列中。字符类内部的括号不计入嵌套深度。
/// 每一列去除首尾空白。
pub fn split_schema_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut escaped = false;
    // 字符类内已读取的字符数，None表示不在字符类中
    let mut class_len: Option<usize> = None;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            if let Some(len) = class_len.as_mut() {
                *len += 1;
            }
            continue;
        }
        if c == '\\' {
            current.push(c);
            escaped = true;
            continue;
        }

        if let Some(len) = class_len {
            current.push(c);
            // `[]...]` 与 `[^]...]` 中开头的 `]` 是字面字符
            class_len = match c {
                ']' if len > 0 => None,
                '^' if len == 0 => Some(0),
                _ => Some(len + 1),
            };
            continue;
        }

        match c {
            '[' => {
                class_len = Some(0);
                current.push(c);
            }
            '{' | '(' => {
                depth += 1;
                current.push(c);
            }
            '}' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// 解析单个字段定义行
///
/// # 参数
/// - `line_no`: 行号（从1开始），用于错误定位
/// - `line`: 定义行文本
///
/// # 返回
/// - `Ok(FieldDefinition)`: 字段定义
/// - `Err(ProtocolError::SchemaFormat)`: 列数不是6或7、数值非法或正则无法编译
pub fn parse_definition_line(line_no: usize, line: &str) -> ProtocolResult<FieldDefinition> {
    let schema_error = |reason: String| ProtocolError::SchemaFormat {
        line: line_no,
        reason,
    };

    let fields = split_schema_fields(line);
    if fields.len() != 6 && fields.len() != 7 {
        return Err(schema_error(format!(
            "expected 6 or 7 fields, got {} in '{line}'",
            fields.len()
        )));
    }

    let id = fields[0]
        .parse::<u16>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| schema_error(format!("invalid field id '{}'", fields[0])))?;

    let name = &fields[1];

    let fixed_length = fields[3]
        .parse::<usize>()
        .ok()
        .filter(|len| *len > 0)
        .ok_or_else(|| schema_error(format!("invalid field length '{}'", fields[3])))?;

    let mut definition = FieldDefinition::new(id, name, fixed_length)
        .variable(fields[4] == "1")
        .numeric(fields[5] == "1");

    let regex = &fields[2];
    if !regex.is_empty() {
        let pattern = FieldPattern::new(regex)
            .map_err(|e| schema_error(format!("invalid pattern '{regex}': {e}")))?;
        definition = definition.with_pattern(pattern);
    }

    if let Some(label) = fields.get(6) {
        definition = definition.with_label(label);
    }

    Ok(definition)
}
