//! 字段定义注册表
//!
//! 由定义文件一次性构建，之后只读，可在多个并发拆包任务之间共享

use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

use isodec_core::{FieldDefinition, ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::line_parser::parse_definition_line;

/// 重复字段编号的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateIdPolicy {
    /// 后出现的定义覆盖先前的定义
    #[default]
    Replace,
    /// 重复定义视为格式错误
    Reject,
}

/// 读取定义文件时的错误
#[derive(Error, Debug)]
pub enum SchemaFileError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Format(#[from] ProtocolError),
}

/// 字段定义注册表：字段编号 → 字段定义
#[derive(Debug, Clone, Default)]
pub struct FieldDefinitionRegistry {
    definitions: BTreeMap<u16, FieldDefinition>,
}

impl FieldDefinitionRegistry {
    /// 从定义文本构建注册表，重复编号按覆盖处理
    pub fn load(schema_text: &str) -> ProtocolResult<Self> {
        Self::load_with_policy(schema_text, DuplicateIdPolicy::default())
    }

    /// 从定义文本构建注册表
    ///
    /// # 参数
    /// - `schema_text`: 定义文件内容，`#` 开头的行与空行被忽略
    /// - `policy`: 重复字段编号的处理策略
    ///
    /// # 返回
    /// - `Ok(FieldDefinitionRegistry)`: 构建完成的注册表
    /// - `Err(ProtocolError::SchemaFormat)`: 任一定义行格式错误
    pub fn load_with_policy(schema_text: &str, policy: DuplicateIdPolicy) -> ProtocolResult<Self> {
        let mut definitions = BTreeMap::new();
        let mut defined_on: BTreeMap<u16, usize> = BTreeMap::new();

        for (index, raw_line) in schema_text.split('\n').enumerate() {
            let line_no = index + 1;
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            let definition = parse_definition_line(line_no, line)?;
            let id = definition.id;

            if let Some(previous_line) = defined_on.insert(id, line_no) {
                match policy {
                    DuplicateIdPolicy::Replace => {
                        warn!(
                            field = id,
                            previous_line,
                            line = line_no,
                            "field redefined, later definition wins"
                        );
                    }
                    DuplicateIdPolicy::Reject => {
                        return Err(ProtocolError::SchemaFormat {
                            line: line_no,
                            reason: format!(
                                "field {id} already defined on line {previous_line}"
                            ),
                        });
                    }
                }
            }
            definitions.insert(id, definition);
        }

        info!(fields = definitions.len(), "field definitions loaded");

        Ok(Self { definitions })
    }

    /// 读取定义文件并构建注册表
    pub fn from_file(
        path: impl AsRef<Path>,
        policy: DuplicateIdPolicy,
    ) -> Result<Self, SchemaFileError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::load_with_policy(&text, policy)?)
    }

    pub fn get(&self, id: u16) -> Option<&FieldDefinition> {
        self.definitions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 按字段编号升序遍历
    pub fn iter(&self) -> btree_map::Values<'_, u16, FieldDefinition> {
        self.definitions.values()
    }
}

impl<'a> IntoIterator for &'a FieldDefinitionRegistry {
    type Item = &'a FieldDefinition;
    type IntoIter = btree_map::Values<'a, u16, FieldDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "\
# id,name,regex,len,variable,numeric,label
2,PAN,^[0-9]{1,19}$,19,1,1,Primary Account Number

3,PROC,^[0-9]{6}$,6,0,1,Processing Code

4,AMOUNT,^[0-9]{12}$,12,0,1
";

    #[test]
    fn test_load_skips_comments_and_blank_lines() {
        let registry = FieldDefinitionRegistry::load(SCHEMA).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get(2).is_some());
        assert!(registry.get(3).is_some());
        assert_eq!(registry.get(4).unwrap().label, "AMOUNT");
        assert!(registry.get(5).is_none());
    }

    #[test]
    fn test_iter_in_ascending_order() {
        let registry = FieldDefinitionRegistry::load("4,B,,1,0,0\n2,A,,1,0,0\n3,C,,1,0,0").unwrap();
        let ids: Vec<u16> = registry.iter().map(|def| def.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_crlf_lines() {
        let registry = FieldDefinitionRegistry::load("2,PAN,,19,1,1,Card\r\n3,PROC,,6,0,1\r\n").unwrap();
        assert_eq!(registry.get(2).unwrap().label, "Card");
        assert_eq!(registry.get(3).unwrap().label, "PROC");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = FieldDefinitionRegistry::load("# header\n2,PAN,,19,1,1\n3,PROC,6\n").unwrap_err();
        assert!(matches!(err, ProtocolError::SchemaFormat { line: 3, .. }));
    }

    #[test]
    fn test_duplicate_id_last_definition_wins() {
        let registry =
            FieldDefinitionRegistry::load("3,PROC,,6,0,1,First\n3,PROC2,,8,0,1,Second\n").unwrap();
        assert_eq!(registry.len(), 1);
        let def = registry.get(3).unwrap();
        assert_eq!(def.label, "Second");
        assert_eq!(def.fixed_length, 8);
    }

    #[test]
    fn test_duplicate_id_rejected_by_policy() {
        let err = FieldDefinitionRegistry::load_with_policy(
            "3,PROC,,6,0,1\n4,AMT,,12,0,1\n3,PROC2,,8,0,1\n",
            DuplicateIdPolicy::Reject,
        )
        .unwrap_err();
        match err {
            ProtocolError::SchemaFormat { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("line 1"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_pattern_with_bracket_in_character_class() {
        let registry = FieldDefinitionRegistry::load(
            "2,PHONE,^[(]?[0-9]+$,19,1,0,Phone\n3,PROC,^[0-9]{6}$,6,0,1\n",
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(2).unwrap().label, "Phone");
        assert_eq!(registry.get(2).unwrap().fixed_length, 19);
    }
}
