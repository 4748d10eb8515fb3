//! isodec: ISO 8583 line decoder
//!
//! Reads files of one-message-per-line ISO 8583 text, decodes every line
//! against a field definition file and prints a JSON report per input.

mod config;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use isodec_decoder::{decode_batch, BatchOptions, BatchPolicy};
use isodec_schema::{FieldDefinitionRegistry, SchemaFileError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};

use crate::config::{FileConfig, Overrides, Settings};
use crate::error::AppError;
use crate::output::FileReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    FailFast,
    CollectErrors,
}

impl From<PolicyArg> for BatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FailFast => BatchPolicy::FailFast,
            PolicyArg::CollectErrors => BatchPolicy::CollectErrors,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "ISODEC_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the field definition file
    #[arg(short, long, env = "ISODEC_SCHEMA")]
    schema: Option<PathBuf>,

    /// What to do when a line fails to decode
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Decode the lines of each file in parallel
    #[arg(long)]
    parallel: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Treat a repeated field number in the definition file as an error
    #[arg(long)]
    reject_duplicate_ids: bool,

    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Message files to decode
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            schema: self.schema.clone(),
            policy: self.policy.map(BatchPolicy::from),
            parallel: self.parallel,
            pretty: self.pretty,
            reject_duplicate_ids: self.reject_duplicate_ids,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("isodec: {e}");
            ExitCode::FAILURE
        }
    }
}

/// 返回 `Ok(false)` 表示至少一个文件读取失败或在 fail-fast 策略下中止
async fn run(args: Args) -> Result<bool, AppError> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file_config, args.overrides())?;

    init_tracing(settings.log_level);

    let registry = load_registry(&settings)?;
    info!(schema = %settings.schema.display(), fields = registry.len(), "registry ready");
    if registry.is_empty() {
        warn!(schema = %settings.schema.display(), "definition file has no fields");
    }
    for definition in &*registry {
        debug!(
            field = definition.id,
            name = %definition.name,
            length = definition.fixed_length,
            variable = definition.is_variable_length,
            "field defined"
        );
    }

    let handles: Vec<_> = args
        .inputs
        .into_iter()
        .map(|path| {
            let registry = Arc::clone(&registry);
            tokio::spawn(decode_file(path, registry, settings.batch))
        })
        .collect();

    let mut all_ok = true;
    for outcome in join_in_order(handles).await {
        match outcome {
            Ok((report, completed)) => {
                all_ok &= completed;
                println!("{}", report.to_json(settings.pretty)?);
            }
            Err(e) => {
                tracing::error!("{e}");
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

/// 安装stderr日志订阅器，返回是否安装成功
///
/// 日志只写stderr，stdout留给JSON输出
fn init_tracing(level: Level) -> bool {
    match tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            eprintln!("isodec: logging not initialised: {e}");
            false
        }
    }
}

/// 读取并解析单个输入文件
///
/// # 返回
/// - `Ok((FileReport, true))`: 批次完成
/// - `Ok((FileReport, false))`: fail-fast 策略下中止
/// - `Err(AppError)`: 文件读取失败或解析任务异常退出
async fn decode_file(
    path: PathBuf,
    registry: Arc<FieldDefinitionRegistry>,
    options: BatchOptions,
) -> Result<(FileReport, bool), AppError> {
    let name = path.display().to_string();
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| AppError::Io { path, source })?;
    let outcome =
        tokio::task::spawn_blocking(move || decode_batch(&text, &registry, &options)).await?;
    Ok(match outcome {
        Ok(report) => (FileReport::from_batch(&name, &report), true),
        Err(failure) => {
            warn!(file = %name, %failure, "batch aborted");
            (FileReport::from_abort(&name, &failure), false)
        }
    })
}

/// 按提交顺序等待所有任务，单个任务异常退出不影响其余任务的结果
async fn join_in_order<T>(
    handles: Vec<JoinHandle<Result<T, AppError>>>,
) -> Vec<Result<T, AppError>> {
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await.map_err(AppError::from).and_then(|outcome| outcome);
        outcomes.push(outcome);
    }
    outcomes
}

fn load_registry(settings: &Settings) -> Result<Arc<FieldDefinitionRegistry>, AppError> {
    FieldDefinitionRegistry::from_file(&settings.schema, settings.duplicate_ids)
        .map(Arc::new)
        .map_err(|e| match e {
            SchemaFileError::Io(source) => AppError::Io {
                path: settings.schema.clone(),
                source,
            },
            SchemaFileError::Format(e) => AppError::Schema(e),
        })
}
