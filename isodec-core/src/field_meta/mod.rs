//! 字段元数据模块
//!
//! 定义字段定义、消息头以及拆包结果等数据结构

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::length_digit_count;

/// 字段内容校验模式
///
/// 保存定义文件中的原始表达式，编译时整体锚定，字段值必须完整匹配
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    regex: Regex,
}

impl FieldPattern {
    /// 编译校验模式
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// 定义文件中的原始表达式
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 字段值是否完整匹配
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// 字段定义
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub id: u16,
    pub name: String,
    pub label: String,
    pub validation_pattern: Option<FieldPattern>,
    pub fixed_length: usize, // 变长字段时为最大长度
    pub is_variable_length: bool,
    pub is_numeric: bool, // 仅作说明，拆包时不校验
    length_digit_count: usize,
}

impl FieldDefinition {
    /// 创建定长字段定义，标签默认与名称相同
    pub fn new(id: u16, name: &str, fixed_length: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            label: name.to_string(),
            validation_pattern: None,
            fixed_length,
            is_variable_length: false,
            is_numeric: false,
            length_digit_count: length_digit_count(fixed_length),
        }
    }

    pub fn variable(mut self, is_variable_length: bool) -> Self {
        self.is_variable_length = is_variable_length;
        self
    }

    pub fn numeric(mut self, is_numeric: bool) -> Self {
        self.is_numeric = is_numeric;
        self
    }

    pub fn with_pattern(mut self, pattern: FieldPattern) -> Self {
        self.validation_pattern = Some(pattern);
        self
    }

    /// 设置显示标签，空标签保持默认值
    pub fn with_label(mut self, label: &str) -> Self {
        if !label.is_empty() {
            self.label = label.to_string();
        }
        self
    }

    /// 长度前缀位数：ceil(log10(fixed_length + 1))
    pub fn length_digit_count(&self) -> usize {
        self.length_digit_count
    }

    /// 校验字段值，无校验模式时总是通过
    pub fn accepts(&self, value: &str) -> bool {
        self.validation_pattern
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(value))
    }
}

/// 消息头：`ISO` + 9位数字 + 4位消息类型 + 16位十六进制主位图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub base_header: String,
    pub message_type: String,
    pub primary_bitmap: String,
}

/// 拆包得到的单个字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedField {
    #[serde(rename = "fieldNo")]
    pub field_number: u16,
    pub label: String,
    pub length: usize,
    pub value: String,
}

/// 一行消息的拆包结果，字段按编号升序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    pub header: MessageHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_bitmap: Option<String>,
    pub fields: Vec<ParsedField>,
}

impl ParsedMessage {
    /// 按字段编号查找
    pub fn field(&self, field_number: u16) -> Option<&ParsedField> {
        self.fields
            .iter()
            .find(|field| field.field_number == field_number)
    }
}
