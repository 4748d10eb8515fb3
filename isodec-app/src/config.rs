//! 配置模块
//!
//! 合并TOML配置文件与命令行参数，命令行优先

use std::path::{Path, PathBuf};

use isodec_decoder::{BatchOptions, BatchPolicy};
use isodec_schema::DuplicateIdPolicy;
use serde::Deserialize;
use tracing::Level;

use crate::error::AppError;

/// 配置文件内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub schema: Option<PathBuf>,
    pub policy: Option<BatchPolicy>,
    pub parallel: Option<bool>,
    pub pretty: Option<bool>,
    pub duplicate_ids: Option<DuplicateIdPolicy>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// 命令行中可覆盖配置文件的部分
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<PathBuf>,
    pub policy: Option<BatchPolicy>,
    pub parallel: bool,
    pub pretty: bool,
    pub reject_duplicate_ids: bool,
    pub log_level: Option<String>,
}

/// 最终生效的运行设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub schema: PathBuf,
    pub batch: BatchOptions,
    pub pretty: bool,
    pub duplicate_ids: DuplicateIdPolicy,
    pub log_level: Level,
}

impl Settings {
    /// 合并配置，缺少定义文件路径时报错
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, AppError> {
        let schema = overrides
            .schema
            .or(file.schema)
            .ok_or(AppError::MissingSchema)?;

        let policy = overrides.policy.or(file.policy).unwrap_or_default();
        let parallel = overrides.parallel || file.parallel.unwrap_or(false);
        let pretty = overrides.pretty || file.pretty.unwrap_or(false);

        let duplicate_ids = if overrides.reject_duplicate_ids {
            DuplicateIdPolicy::Reject
        } else {
            file.duplicate_ids.unwrap_or_default()
        };

        let log_level = match overrides.log_level.or(file.log_level) {
            Some(level) => level
                .parse::<Level>()
                .map_err(|_| AppError::InvalidLogLevel(level))?,
            None => Level::INFO,
        };

        Ok(Self {
            schema,
            batch: BatchOptions { policy, parallel },
            pretty,
            duplicate_ids,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_config() {
        let config = FileConfig::parse(
            r#"
schema = "schemas/base24.csv"
policy = "fail-fast"
parallel = true
duplicate_ids = "reject"
log_level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.schema, Some(PathBuf::from("schemas/base24.csv")));
        assert_eq!(config.policy, Some(BatchPolicy::FailFast));
        assert_eq!(config.parallel, Some(true));
        assert_eq!(config.pretty, None);
        assert_eq!(config.duplicate_ids, Some(DuplicateIdPolicy::Reject));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("schema = \"a.csv\"\nverbose = true\n").is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(
            FileConfig::default(),
            Overrides {
                schema: Some(PathBuf::from("defs.csv")),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(settings.batch.policy, BatchPolicy::CollectErrors);
        assert!(!settings.batch.parallel);
        assert!(!settings.pretty);
        assert_eq!(settings.duplicate_ids, DuplicateIdPolicy::Replace);
        assert_eq!(settings.log_level, Level::INFO);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = FileConfig {
            schema: Some(PathBuf::from("file.csv")),
            policy: Some(BatchPolicy::CollectErrors),
            log_level: Some("warn".to_string()),
            ..FileConfig::default()
        };
        let overrides = Overrides {
            schema: Some(PathBuf::from("cli.csv")),
            policy: Some(BatchPolicy::FailFast),
            reject_duplicate_ids: true,
            log_level: Some("trace".to_string()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(file, overrides).unwrap();
        assert_eq!(settings.schema, PathBuf::from("cli.csv"));
        assert_eq!(settings.batch.policy, BatchPolicy::FailFast);
        assert_eq!(settings.duplicate_ids, DuplicateIdPolicy::Reject);
        assert_eq!(settings.log_level, Level::TRACE);
    }

    #[test]
    fn test_missing_schema() {
        let err = Settings::resolve(FileConfig::default(), Overrides::default()).unwrap_err();
        assert!(matches!(err, AppError::MissingSchema));
    }

    #[test]
    fn test_invalid_log_level() {
        let overrides = Overrides {
            schema: Some(PathBuf::from("defs.csv")),
            log_level: Some("loud".to_string()),
            ..Overrides::default()
        };
        let err = Settings::resolve(FileConfig::default(), overrides).unwrap_err();
        assert!(matches!(err, AppError::InvalidLogLevel(level) if level == "loud"));
    }
}
