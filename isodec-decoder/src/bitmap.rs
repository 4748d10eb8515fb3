//! 位图解码模块
//!
//! 将十六进制位图文本解码为字段编号序列。位编号从1开始、高位在前，
//! 第1位表示紧随其后存在二级位图，不对应数据字段。

use isodec_core::{ProtocolError, ProtocolResult, BITMAP_HEX_LEN};

/// 主位图加可选的二级位图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap {
    primary: u64,
    secondary: Option<u64>,
}

impl Bitmap {
    /// 解码位图
    ///
    /// # 参数
    /// - `primary_hex`: 16位十六进制主位图
    /// - `secondary_hex`: 16位十六进制二级位图，仅在主位图第1位置位时使用
    ///
    /// # 返回
    /// - `Ok(Bitmap)`: 解码结果
    /// - `Err(ProtocolError::InvalidBitmap)`: 位图文本不是16位十六进制，或第1位置位但缺少二级位图
    ///
    /// 行长度不足以容纳二级位图时由调用方报告 `MessageTooShort`
    pub fn decode(primary_hex: &str, secondary_hex: Option<&str>) -> ProtocolResult<Self> {
        let primary = parse_bitmap_word(primary_hex)?;

        let secondary = if primary & (1u64 << 63) != 0 {
            let hex_str = secondary_hex.ok_or_else(|| {
                ProtocolError::InvalidBitmap(format!(
                    "{primary_hex}: bit 1 set but no secondary bitmap given"
                ))
            })?;
            Some(parse_bitmap_word(hex_str)?)
        } else {
            None
        };

        Ok(Self { primary, secondary })
    }

    /// 主位图第1位是否置位（即是否跟随二级位图）
    pub fn secondary_flag(primary_hex: &str) -> bool {
        primary_hex
            .chars()
            .next()
            .and_then(|c| c.to_digit(16))
            .is_some_and(|nibble| nibble & 0x8 != 0)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// 可寻址的最大位编号：64 或 128
    pub fn max_position(&self) -> u16 {
        if self.has_secondary() {
            128
        } else {
            64
        }
    }

    /// 指定位（从1开始）是否置位，超出范围返回false
    pub fn is_set(&self, position: u16) -> bool {
        match position {
            1..=64 => (self.primary >> (64 - position)) & 1 == 1,
            65..=128 => self
                .secondary
                .is_some_and(|word| (word >> (128 - position)) & 1 == 1),
            _ => false,
        }
    }

    /// 已置位的字段编号（不含控制位1），升序
    pub fn field_numbers(&self) -> Vec<u16> {
        (2..=self.max_position())
            .filter(|position| self.is_set(*position))
            .collect()
    }
}

/// 将16位十六进制文本解析为64位位图
fn parse_bitmap_word(hex_str: &str) -> ProtocolResult<u64> {
    if hex_str.len() != BITMAP_HEX_LEN {
        return Err(ProtocolError::InvalidBitmap(hex_str.to_string()));
    }
    let bytes: [u8; 8] = hex::decode(hex_str)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| ProtocolError::InvalidBitmap(hex_str.to_string()))?;
    Ok(u64::from_be_bytes(bytes))
}
