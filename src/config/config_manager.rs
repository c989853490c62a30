// ==========================================
// 表格数据导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope, 仅使用 global)
// 规则: 配置缺失或格式错误时回退默认值（格式错误记 warn）
// ==========================================

use crate::config::import_config_trait::{ConfigError, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::logging::LogFormat;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取并解析配置,缺失或格式错误时返回默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_big_file_threshold(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::BIG_FILE_THRESHOLD, 10)
    }

    fn get_csv_delimiter(&self) -> Result<u8, ConfigError> {
        let raw = self.get_global_config_value(config_keys::CSV_DELIMITER)?;
        match raw.as_deref() {
            None => Ok(b','),
            Some("\\t") | Some("tab") => Ok(b'\t'),
            Some(value) if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
            Some(value) => {
                tracing::warn!(
                    config_key = config_keys::CSV_DELIMITER,
                    raw_value = %value,
                    "分隔符必须为单个 ASCII 字符，使用默认值"
                );
                Ok(b',')
            }
        }
    }

    fn get_trim_values(&self) -> Result<bool, ConfigError> {
        self.get_parsed_or_default(config_keys::TRIM_VALUES, true)
    }

    fn get_log_format(&self) -> Result<LogFormat, ConfigError> {
        let raw = self.get_global_config_value(config_keys::LOG_FORMAT)?;
        Ok(raw
            .as_deref()
            .and_then(LogFormat::parse)
            .unwrap_or_default())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 大文件阈值（行数）
    pub const BIG_FILE_THRESHOLD: &str = "import_big_file_threshold";

    // CSV 解析
    pub const CSV_DELIMITER: &str = "import_csv_delimiter";
    pub const TRIM_VALUES: &str = "import_trim_values";

    // 日志
    pub const LOG_FORMAT: &str = "log_format";
}
