// ==========================================
// 表格数据导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + csv
// 系统定位: CSV 行校验 + 事务化批量导入（全有或全无）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 导入任务记录
pub mod repository;

// 导入层 - 解析 / 校验 / 编排
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{BatchResult, ImportJob, ImportState, JobStatus, Outcome, Row, RowResult};

// 导入
pub use importer::{
    ImportError, ImportJobRunner, ImportOrchestrator, ImportResult, RowCoercer, RowProcessor,
    ValueParser,
};

// 仓储
pub use repository::{JobStore, SqliteJobStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "tabular-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
