// ==========================================
// 表格数据导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::logging::LogFormat;
use thiserror::Error;

/// 配置读取错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config lock poisoned: {0}")]
    LockError(String),

    #[error("Config query failed: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::DatabaseError(err.to_string())
    }
}

// ==========================================
// ImportSettings - 单次导入使用的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    /// 大文件阈值（数据行数超过该值建议后台执行）
    pub big_file_threshold: usize,
    /// CSV 分隔符
    pub delimiter: u8,
    /// 是否去除单元格首尾空白
    pub trim_values: bool,
    pub log_format: LogFormat,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            big_file_threshold: 10,
            delimiter: b',',
            trim_values: true,
            log_format: LogFormat::Plain,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 获取大文件阈值
    ///
    /// # 默认值
    /// - 10
    fn get_big_file_threshold(&self) -> Result<usize, ConfigError>;

    /// 获取 CSV 分隔符（单个 ASCII 字符）
    ///
    /// # 默认值
    /// - ','
    fn get_csv_delimiter(&self) -> Result<u8, ConfigError>;

    /// 是否去除单元格首尾空白
    ///
    /// # 默认值
    /// - true
    fn get_trim_values(&self) -> Result<bool, ConfigError>;

    /// 获取日志输出格式
    ///
    /// # 默认值
    /// - plain
    fn get_log_format(&self) -> Result<LogFormat, ConfigError>;

    /// 一次性读取全部导入配置
    fn load_settings(&self) -> Result<ImportSettings, ConfigError> {
        Ok(ImportSettings {
            big_file_threshold: self.get_big_file_threshold()?,
            delimiter: self.get_csv_delimiter()?,
            trim_values: self.get_trim_values()?,
            log_format: self.get_log_format()?,
        })
    }
}
