// ==========================================
// 表格数据导入系统 - 事务化批量导入编排器
// ==========================================
// 流程: 清空旧数据(可选) → 开始提示 → before_rows → 解析 → 逐行处理 → after_rows → 结束提示
//       → 汇总 → 全部成功则提交,否则整体回滚 → 后台模式回写任务
// 状态: INITIALIZED → RUNNING → {COMMITTED, ROLLED_BACK, FAILED}
// 红线: 全有或全无,任一行失败则所有行与清空操作一并回滚
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{BatchResult, ImportState, JobStatus, RowResult};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, ParsedCsv};
use crate::importer::output_sink::{DiscardSink, OutputSink};
use crate::importer::row_processor::{ImportArguments, RowContext, RowProcessor};
use crate::repository::JobStore;
use rusqlite::{Connection, Transaction};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub const MSG_STARTING: &str = "Starting import";
pub const MSG_FINISHED: &str = "Finished import";
pub const MSG_ROLLBACK: &str = "Import failed, rolling back all changes";

/// 钩子函数: 在导入事务内执行
pub type HookFn = Box<dyn FnMut(&Transaction<'_>) -> ImportResult<()> + Send>;

fn noop_hook() -> HookFn {
    Box::new(|_tx: &Transaction<'_>| Ok(()))
}

// ==========================================
// ImportHooks - 导入钩子
// ==========================================
// 默认均为空操作
pub struct ImportHooks {
    /// 替换模式下清空旧数据
    pub destroy_existing: HookFn,
    pub before_rows: HookFn,
    pub after_rows: HookFn,
}

impl Default for ImportHooks {
    fn default() -> Self {
        Self {
            destroy_existing: noop_hook(),
            before_rows: noop_hook(),
            after_rows: noop_hook(),
        }
    }
}

/// 关联的导入任务
struct JobLink {
    store: Arc<dyn JobStore>,
    job_id: String,
}

// ==========================================
// ImportOrchestratorBuilder
// ==========================================
pub struct ImportOrchestratorBuilder {
    processor: Box<dyn RowProcessor>,
    text: Option<String>,
    job: Option<(Arc<dyn JobStore>, String)>,
    replace_existing: Option<bool>,
    background: Option<bool>,
    arguments: ImportArguments,
    hooks: ImportHooks,
    sink: Option<Box<dyn OutputSink>>,
    settings: ImportSettings,
}

impl ImportOrchestratorBuilder {
    /// 直接提供 CSV 文本
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// 从导入任务读取文件与标志位
    pub fn job(mut self, store: Arc<dyn JobStore>, job_id: impl Into<String>) -> Self {
        self.job = Some((store, job_id.into()));
        self
    }

    /// 覆盖替换模式（默认 false,或取任务上的标志）
    pub fn replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = Some(replace);
        self
    }

    /// 覆盖后台模式（默认取任务上的标志）
    pub fn background(mut self, background: bool) -> Self {
        self.background = Some(background);
        self
    }

    pub fn argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key, value);
        self
    }

    pub fn arguments(mut self, arguments: ImportArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn destroy_existing<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Transaction<'_>) -> ImportResult<()> + Send + 'static,
    {
        self.hooks.destroy_existing = Box::new(hook);
        self
    }

    pub fn before_rows<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Transaction<'_>) -> ImportResult<()> + Send + 'static,
    {
        self.hooks.before_rows = Box::new(hook);
        self
    }

    pub fn after_rows<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Transaction<'_>) -> ImportResult<()> + Send + 'static,
    {
        self.hooks.after_rows = Box::new(hook);
        self
    }

    pub fn sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 校验构造参数并生成编排器
    ///
    /// # 返回
    /// - Err(Configuration): 缺少必填参数或文件来源
    /// - Err(JobNotFound / InvalidJobFile): 任务读取失败
    pub fn build(self) -> ImportResult<ImportOrchestrator> {
        let type_name = self.processor.type_name().to_string();

        let missing = self.arguments.missing(self.processor.required_arguments());
        if !missing.is_empty() {
            return Err(ImportError::Configuration { type_name, missing });
        }

        let (text, job_replace, job_background, job) = match (self.text, self.job) {
            (text, Some((store, job_id))) => {
                let record = store.find(&job_id)?;
                let text = match text {
                    Some(text) => text,
                    None => record
                        .read_file()
                        .map_err(|_| ImportError::InvalidJobFile(job_id.clone()))?
                        .to_string(),
                };
                (
                    text,
                    record.replace_existing,
                    record.processing_in_background(),
                    Some(JobLink { store, job_id }),
                )
            }
            (Some(text), None) => (text, false, false, None),
            (None, None) => {
                return Err(ImportError::Configuration {
                    type_name,
                    missing: vec!["file".to_string()],
                });
            }
        };

        Ok(ImportOrchestrator {
            processor: self.processor,
            text,
            replace_existing: self.replace_existing.unwrap_or(job_replace),
            background: self.background.unwrap_or(job_background),
            job,
            arguments: self.arguments,
            hooks: self.hooks,
            sink: self.sink.unwrap_or_else(|| Box::new(DiscardSink)),
            settings: self.settings,
            state: ImportState::Initialized,
            result: None,
        })
    }
}

// ==========================================
// ImportOrchestrator
// ==========================================
pub struct ImportOrchestrator {
    processor: Box<dyn RowProcessor>,
    text: String,
    replace_existing: bool,
    background: bool,
    job: Option<JobLink>,
    arguments: ImportArguments,
    hooks: ImportHooks,
    sink: Box<dyn OutputSink>,
    settings: ImportSettings,
    state: ImportState,
    result: Option<BatchResult>,
}

impl ImportOrchestrator {
    pub fn builder(processor: impl RowProcessor + 'static) -> ImportOrchestratorBuilder {
        ImportOrchestratorBuilder {
            processor: Box::new(processor),
            text: None,
            job: None,
            replace_existing: None,
            background: None,
            arguments: ImportArguments::new(),
            hooks: ImportHooks::default(),
            sink: None,
            settings: ImportSettings::default(),
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    pub fn result(&self) -> Option<&BatchResult> {
        self.result.as_ref()
    }

    pub fn replace_existing(&self) -> bool {
        self.replace_existing
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job.as_ref().map(|j| j.job_id.as_str())
    }

    pub fn type_name(&self) -> &str {
        self.processor.type_name()
    }

    /// 数据行数是否超过大文件阈值（用于选择前台/后台执行）
    pub fn big_file(&self) -> ImportResult<bool> {
        let parsed = self.parse()?;
        Ok(parsed.row_count() > self.settings.big_file_threshold)
    }

    /// 最近一次运行是否成功
    pub fn succeeded(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_success())
    }

    /// 最近一次运行实际落库的行数
    pub fn number_imported(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.imported_count())
    }

    /// 执行导入
    ///
    /// # 参数
    /// - conn: 目标库连接; 事务在本方法内开启并在返回前提交或回滚
    ///
    /// # 返回
    /// - BatchResult: 行级失败时 results 含明细; 运行中止时 error 含原因
    #[instrument(skip(self, conn), fields(processor = %self.processor.type_name(), job_id))]
    pub fn run(&mut self, conn: &mut Connection) -> BatchResult {
        let start_time = Instant::now();
        if let Some(job_id) = self.job_id() {
            tracing::Span::current().record("job_id", job_id);
        }

        self.state = ImportState::Running;
        info!(
            replace_existing = self.replace_existing,
            background = self.background,
            "开始导入"
        );

        let result = match self.run_in_transaction(conn) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "导入中止，事务已回滚");
                self.state = ImportState::Failed;
                BatchResult::aborted(e.to_string())
            }
        };

        info!(
            state = %self.state,
            total = result.results.len(),
            imported = result.imported_count(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入结束"
        );

        self.complete(result)
    }

    /// 未能开始运行时（例如目标库无法打开）直接以失败结束
    pub fn abort(&mut self, err: ImportError) -> BatchResult {
        error!(error = %err, "导入未能开始");
        self.state = ImportState::Failed;
        self.complete(BatchResult::aborted(err.to_string()))
    }

    fn complete(&mut self, result: BatchResult) -> BatchResult {
        self.report(&result);

        if self.background {
            if let Err(e) = self.finalize_job(&result) {
                error!(error = %e, "导入任务结果回写失败");
            }
        }

        self.result = Some(result.clone());
        result
    }

    fn run_in_transaction(&mut self, conn: &mut Connection) -> ImportResult<BatchResult> {
        let tx = conn.transaction()?;
        let outcome = self.execute_steps(&tx);

        // 事务已不存在: 既不能提交也不能回滚
        if tx.is_autocommit() {
            return Err(match outcome {
                Err(e) => e,
                Ok(_) => ImportError::Internal(
                    "transaction ended before the import could commit".to_string(),
                ),
            });
        }

        match outcome {
            Ok(result) if result.is_success() => {
                tx.commit()?;
                self.state = ImportState::Committed;
                debug!("事务已提交");
                Ok(result)
            }
            Ok(result) => {
                tx.rollback()?;
                self.state = ImportState::RolledBack;
                warn!(
                    failed_rows = result.failed_rows().count(),
                    "存在行级错误，事务已回滚"
                );
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(e)
            }
        }
    }

    fn execute_steps(&mut self, tx: &Transaction<'_>) -> ImportResult<BatchResult> {
        // === 步骤 1: 替换模式下清空旧数据 ===
        if self.replace_existing {
            debug!("步骤 1: 清空旧数据");
            (self.hooks.destroy_existing)(tx)
                .map_err(|e| ImportError::hook("destroy_existing", e))?;
        }

        // === 步骤 2-3: 开始提示 + before_rows ===
        self.say(MSG_STARTING);
        (self.hooks.before_rows)(tx).map_err(|e| ImportError::hook("before_rows", e))?;

        // === 步骤 4: 解析 ===
        let parsed = self.parse()?;
        if parsed.rows.is_empty() {
            return Err(ImportError::EmptyInput);
        }
        info!(total_rows = parsed.row_count(), "文件解析完成");

        // === 步骤 5: 逐行处理（文件顺序,行号从 2 开始）===
        let mut results = Vec::with_capacity(parsed.row_count());
        for (idx, row) in parsed.rows.iter().enumerate() {
            let ctx = RowContext {
                row_number: idx + 2,
                arguments: &self.arguments,
                replace_existing: self.replace_existing,
            };

            let errors = match self.processor.process(tx, &ctx, row, &parsed.headers) {
                Ok(outcome) => outcome.errors,
                Err(e) if e.aborts_batch() => return Err(e),
                // 之后的语句会以自动提交方式直接落库,必须立即停止
                Err(e) if tx.is_autocommit() => {
                    return Err(ImportError::TransactionLost {
                        row_number: ctx.row_number,
                        message: e.to_string(),
                    });
                }
                Err(e) => vec![e.to_string()],
            };

            if !errors.is_empty() {
                debug!(row_number = ctx.row_number, errors = ?errors, "行处理失败");
            }
            results.push(RowResult::new(ctx.row_number, errors));
        }

        // === 步骤 6-7: after_rows + 结束提示 ===
        (self.hooks.after_rows)(tx).map_err(|e| ImportError::hook("after_rows", e))?;
        self.say(MSG_FINISHED);

        // === 步骤 8: 汇总 ===
        Ok(BatchResult::from_rows(results))
    }

    fn parse(&self) -> ImportResult<ParsedCsv> {
        CsvParser::from_settings(&self.settings).parse_text(&self.text)
    }

    /// 输出提示; 后台模式同时写入日志
    fn say(&mut self, message: &str) {
        self.sink.write(message);
        if self.background {
            info!(target: "tabular_import::background", "{}", message);
        }
    }

    /// 成功: 单条成功提示; 失败: 回滚提示 + (运行错误 | 逐行错误)
    fn report(&mut self, result: &BatchResult) {
        if result.is_success() {
            let message = format!(
                "Import succeeded: {} rows imported",
                result.imported_count()
            );
            self.say(&message);
            return;
        }

        self.say(MSG_ROLLBACK);
        if let Some(error) = &result.error {
            self.say(error);
        } else {
            let lines: Vec<String> = result.failed_rows().map(|r| r.error_line()).collect();
            for line in lines {
                self.say(&line);
            }
        }
    }

    /// 回写任务结果并标记完成
    fn finalize_job(&self, result: &BatchResult) -> ImportResult<()> {
        let Some(job) = &self.job else {
            return Ok(());
        };

        job.store.save(
            &job.job_id,
            JobStatus::from(result.status),
            result,
            result.imported_count(),
        )?;
        job.store.mark_finished(&job.job_id)?;
        debug!(job_id = %job.job_id, "导入任务已回写");
        Ok(())
    }
}
