// ==========================================
// 表格数据导入系统 - 导入任务执行器
// ==========================================
// 职责: 按任务的后台标志选择执行方式
// - 前台: 当前线程同步执行
// - 后台: tokio spawn_blocking 执行整批同步导入,完成后回调
// 约束: 只负责调度,行处理仍严格顺序执行
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::BatchResult;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::orchestrator::{ImportOrchestrator, ImportOrchestratorBuilder};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 完成回调
pub type CompletionCallback = Box<dyn FnOnce(&BatchResult) + Send>;

/// 一次任务执行
pub enum JobRun {
    /// 前台执行已完成
    Completed(BatchResult),
    /// 后台执行中
    Background(JoinHandle<BatchResult>),
}

impl JobRun {
    pub fn is_background(&self) -> bool {
        matches!(self, JobRun::Background(_))
    }

    /// 等待执行结束
    pub async fn wait(self) -> ImportResult<BatchResult> {
        match self {
            JobRun::Completed(result) => Ok(result),
            JobRun::Background(handle) => handle
                .await
                .map_err(|e| ImportError::Internal(format!("background import panicked: {}", e))),
        }
    }
}

// ==========================================
// ImportJobRunner
// ==========================================
pub struct ImportJobRunner {
    db_path: String,
}

impl ImportJobRunner {
    /// # 参数
    /// - db_path: 导入目标库路径（每次执行单独打开连接）
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// 构造编排器并执行
    ///
    /// # 返回
    /// - Ok(JobRun::Completed): 前台任务已执行完毕
    /// - Ok(JobRun::Background): 后台任务已提交（需在 tokio 运行时内调用）
    /// - Err: 构造失败（配置错误 / 任务不存在）,或后台模式下不在运行时内
    pub fn start(
        &self,
        builder: ImportOrchestratorBuilder,
        on_complete: Option<CompletionCallback>,
    ) -> ImportResult<JobRun> {
        let orchestrator = builder.build()?;

        if !orchestrator.is_background() {
            let result = Self::execute(&self.db_path, orchestrator, on_complete);
            return Ok(JobRun::Completed(result));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ImportError::Internal(format!("no tokio runtime for background import: {}", e)))?;

        info!(
            job_id = orchestrator.job_id().unwrap_or("-"),
            processor = orchestrator.type_name(),
            "提交后台导入任务"
        );

        let db_path = self.db_path.clone();
        let handle = runtime.spawn_blocking(move || Self::execute(&db_path, orchestrator, on_complete));
        Ok(JobRun::Background(handle))
    }

    fn execute(
        db_path: &str,
        mut orchestrator: ImportOrchestrator,
        on_complete: Option<CompletionCallback>,
    ) -> BatchResult {
        let result = match open_sqlite_connection(db_path) {
            Ok(mut conn) => orchestrator.run(&mut conn),
            Err(e) => {
                error!(error = %e, db_path = %db_path, "打开导入目标库失败");
                orchestrator.abort(ImportError::from(e))
            }
        };

        if let Some(callback) = on_complete {
            callback(&result);
        }
        result
    }
}
