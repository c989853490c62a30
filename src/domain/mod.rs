// ==========================================
// 表格数据导入系统 - 领域模型层
// ==========================================
// 职责: 定义导入实体与状态类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod types;

// 重导出核心类型
pub use import::{BatchResult, ImportJob, Row, RowResult};
pub use types::{ImportState, JobStatus, Outcome};
