use std::fmt;
use std::path::PathBuf;

/// 流水线错误
#[derive(Debug)]
pub enum PipelineError {
    /// 供应商文件中找不到任何可映射为商品名称的列 (致命, 中止该供应商)
    MissingProductColumn {
        supplier: String,
        columns: Vec<String>,
    },
    /// 配置的供应商文件不存在 (非致命, 跳过并告警)
    MissingInput { supplier: String, path: PathBuf },
    /// 请求引用了未配置的供应商
    UnknownSupplier { names: Vec<String> },
    Csv(csv::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Database(sqlx::Error),
    Config(String),
    /// 数据库批量写入超时
    Timeout(&'static str),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingProductColumn { supplier, columns } => write!(
                f,
                "[CONFIG] product name column missing in {} source (columns: {})",
                supplier,
                columns.join(", ")
            ),
            PipelineError::MissingInput { supplier, path } => write!(
                f,
                "[INPUT] source file for {} not found: {}",
                supplier,
                path.display()
            ),
            PipelineError::UnknownSupplier { names } => {
                write!(f, "[INPUT] unknown suppliers: {}", names.join(", "))
            }
            PipelineError::Csv(e) => write!(f, "[CSV] {}", e),
            PipelineError::Io(e) => write!(f, "[IO] {}", e),
            PipelineError::Json(e) => write!(f, "[JSON] {}", e),
            PipelineError::Database(e) => write!(f, "[DATABASE] {}", e),
            PipelineError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            PipelineError::Timeout(op) => write!(f, "[DATABASE] {} timed out", op),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Csv(e) => Some(e),
            PipelineError::Io(e) => Some(e),
            PipelineError::Json(e) => Some(e),
            PipelineError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err)
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::Database(err)
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
