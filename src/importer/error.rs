// ==========================================
// 表格数据导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 行级校验错误（可恢复） / 配置错误 / 输入错误 / 基础设施错误
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 单列取值校验失败（行级,可恢复）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvalidValueError {
    pub key: String,
    pub message: String,
}

impl InvalidValueError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入错误 =====
    #[error("No rows to import: the file contains no data rows")]
    EmptyInput,

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Import file for job {0} is not valid UTF-8")]
    InvalidJobFile(String),

    // ===== 配置错误 =====
    #[error("{type_name} is missing required argument(s): {}", missing.join(", "))]
    Configuration {
        type_name: String,
        missing: Vec<String>,
    },

    #[error("{0} must implement process_row")]
    NotImplemented(String),

    // ===== 行级错误 =====
    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),

    // ===== 任务存储 =====
    #[error("Import job not found: {0}")]
    JobNotFound(String),

    // ===== 基础设施错误 =====
    #[error("{hook} hook failed: {message}")]
    Hook { hook: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    /// SQLite 已自行回滚整个事务（INSERT OR ROLLBACK / RAISE(ROLLBACK) / 磁盘满等）
    #[error("Row {row_number}: the database rolled back the import transaction: {message}")]
    TransactionLost { row_number: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 行处理中出现时是否中止整批（而不是记为行错误）
    pub fn aborts_batch(&self) -> bool {
        matches!(self, ImportError::NotImplemented(_))
    }

    pub fn hook(hook: &str, err: impl std::fmt::Display) -> Self {
        ImportError::Hook {
            hook: hook.to_string(),
            message: err.to_string(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Internal(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParse(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Serialization(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { id, .. } => ImportError::JobNotFound(id),
            other => ImportError::Database(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
