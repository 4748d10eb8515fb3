//! 工具模块
//!
//! 提供isodec系统中常用的工具函数

/// 表示 `fixed_length + 1` 所需的十进制位数，即 ceil(log10(fixed_length + 1))
///
/// 使用整数运算，避免浮点误差
pub fn length_digit_count(fixed_length: usize) -> usize {
    // ceil(log10(n + 1)) 等于 n 的十进制位数
    let mut digits = 0;
    let mut remaining = fixed_length;
    while remaining > 0 {
        digits += 1;
        remaining /= 10;
    }
    digits
}

/// 将单个十六进制字符展开为4位二进制字符串（高位补零）
pub fn hex_digit_to_binary(c: char) -> Option<String> {
    c.to_digit(16).map(|nibble| format!("{nibble:04b}"))
}

/// 将十六进制字符串逐字符展开为二进制字符串
pub fn hex_to_binary(hex_str: &str) -> Option<String> {
    hex_str.chars().map(hex_digit_to_binary).collect()
}

/// 字符偏移转换为字节偏移，超出字符串时返回None
pub fn char_to_byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_offset) {
        Some((byte_offset, _)) => Some(byte_offset),
        None if text.chars().count() == char_offset => Some(text.len()),
        None => None,
    }
}

/// 按字符偏移截取子串
///
/// # 参数
/// - `text`: 原始文本
/// - `start`: 起始字符偏移
/// - `count`: 字符个数
///
/// # 返回
/// - `Some(&str)`: 截取结果
/// - `None`: 超出文本边界
pub fn char_slice(text: &str, start: usize, count: usize) -> Option<&str> {
    let begin = char_to_byte_offset(text, start)?;
    let rest = &text[begin..];
    let end = char_to_byte_offset(rest, count)?;
    Some(&rest[..end])
}
