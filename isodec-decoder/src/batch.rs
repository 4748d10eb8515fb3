//! 批量解析模块
//!
//! 将文本按行拆分后逐行解析。单行失败只丢弃该行；批次是否继续由 `BatchPolicy` 决定。

use isodec_core::{ParsedMessage, ProtocolError};
use isodec_schema::FieldDefinitionRegistry;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::message_parser::MessageParser;

/// 批次错误处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// 第一行失败即终止整个批次
    FailFast,
    /// 继续解析后续行，汇总所有失败
    #[default]
    CollectErrors,
}

/// 批量解析选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub policy: BatchPolicy,
    /// 使用rayon并行解析各行
    pub parallel: bool,
}

/// 成功解析的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub line: usize,
    pub message: ParsedMessage,
}

/// 解析失败的一行
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {error}")]
pub struct LineFailure {
    pub line: usize,
    #[source]
    pub error: ProtocolError,
}

/// 批量解析结果，两个列表均按行号升序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub parsed: Vec<ParsedLine>,
    pub failures: Vec<LineFailure>,
}

impl BatchReport {
    /// 参与解析的行数（不含空行）
    pub fn total_lines(&self) -> usize {
        self.parsed.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 拆分输入文本：跳过空白行，去除首尾空白，行号从1开始
pub fn split_lines(text: &str) -> Vec<(usize, &str)> {
    text.split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.trim()))
        .collect()
}

/// 批量解析消息文本
///
/// # 参数
/// - `text`: 多行消息文本
/// - `registry`: 只读共享的字段定义注册表
/// - `options`: 错误处理策略与是否并行
///
/// # 返回
/// - `Ok(BatchReport)`: 各行解析结果
/// - `Err(LineFailure)`: `FailFast` 策略下第一行失败（按行号）
pub fn decode_batch(
    text: &str,
    registry: &FieldDefinitionRegistry,
    options: &BatchOptions,
) -> Result<BatchReport, LineFailure> {
    let parser = MessageParser::new(registry);
    let lines = split_lines(text);

    let decode = |&(line, content): &(usize, &str)| {
        debug!(line, "decoding line");
        parser
            .parse_line(content)
            .map(|message| ParsedLine { line, message })
            .map_err(|error| LineFailure { line, error })
    };

    let outcomes: Vec<Result<ParsedLine, LineFailure>> = if options.parallel {
        lines.par_iter().map(decode).collect()
    } else if options.policy == BatchPolicy::FailFast {
        // 顺序模式下遇错即停，不再解析后续行
        let mut outcomes = Vec::with_capacity(lines.len());
        for entry in &lines {
            let outcome = decode(entry);
            let failed = outcome.is_err();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        outcomes
    } else {
        lines.iter().map(decode).collect()
    };

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(parsed) => report.parsed.push(parsed),
            Err(failure) if options.policy == BatchPolicy::FailFast => return Err(failure),
            Err(failure) => report.failures.push(failure),
        }
    }

    info!(
        parsed = report.parsed.len(),
        failed = report.failures.len(),
        "batch decoded"
    );

    Ok(report)
}
