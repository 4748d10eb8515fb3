//! 输出模块
//!
//! 将批量解析结果整理为JSON文档：`message`、`data: [{line, fields}]` 与 `errors`

use isodec_core::ParsedField;
use isodec_decoder::{BatchReport, LineFailure};
use serde::Serialize;

/// 单个输入文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub message: String,
    pub data: Vec<LineData>,
    pub errors: Vec<LineError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineData {
    pub line: usize,
    pub fields: Vec<ParsedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    pub line: usize,
    pub kind: &'static str,
    #[serde(rename = "fieldNo", skip_serializing_if = "Option::is_none")]
    pub field_number: Option<u16>,
    pub error: String,
}

impl From<&LineFailure> for LineError {
    fn from(failure: &LineFailure) -> Self {
        Self {
            line: failure.line,
            kind: failure.error.kind(),
            field_number: failure.error.field_number(),
            error: failure.error.to_string(),
        }
    }
}

impl FileReport {
    /// 批次完成（可能包含失败行）
    pub fn from_batch(file: &str, report: &BatchReport) -> Self {
        let message = if report.is_clean() {
            "File processed successfully"
        } else {
            "File processed with errors"
        };
        Self {
            file: file.to_string(),
            message: message.to_string(),
            data: report
                .parsed
                .iter()
                .map(|parsed| LineData {
                    line: parsed.line,
                    fields: parsed.message.fields.clone(),
                })
                .collect(),
            errors: report.failures.iter().map(LineError::from).collect(),
        }
    }

    /// 批次因某一行失败而中止
    pub fn from_abort(file: &str, failure: &LineFailure) -> Self {
        Self {
            file: file.to_string(),
            message: "Error processing file".to_string(),
            data: Vec::new(),
            errors: vec![LineError::from(failure)],
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
