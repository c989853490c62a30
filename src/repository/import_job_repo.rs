// ==========================================
// 表格数据导入系统 - 导入任务存储 Trait
// ==========================================
// 职责: 定义导入任务记录的读写接口（不包含业务逻辑）
// 红线: 导入核心只读取文件与标志位,并在结束时回写结果
// ==========================================

use crate::domain::{BatchResult, ImportJob, JobStatus};
use crate::repository::error::RepositoryResult;

// ==========================================
// JobStore Trait
// ==========================================
// 实现者: SqliteJobStore（使用 rusqlite）
pub trait JobStore: Send + Sync {
    /// 新建导入任务
    fn create(&self, job: &ImportJob) -> RepositoryResult<()>;

    /// 按 ID 查询导入任务
    ///
    /// # 返回
    /// - Ok(ImportJob)
    /// - Err(RepositoryError::NotFound): 任务不存在
    fn find(&self, job_id: &str) -> RepositoryResult<ImportJob>;

    /// 回写导入结果
    ///
    /// # 参数
    /// - status: 任务状态（由批次结果推导）
    /// - result: 批次结果（JSON 落库）
    /// - imported_count: 实际落库行数
    fn save(
        &self,
        job_id: &str,
        status: JobStatus,
        result: &BatchResult,
        imported_count: usize,
    ) -> RepositoryResult<()>;

    /// 标记任务完成（写入 finished_at）
    fn mark_finished(&self, job_id: &str) -> RepositoryResult<()>;
}
