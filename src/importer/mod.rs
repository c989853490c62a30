// ==========================================
// 表格数据导入系统 - 导入层
// ==========================================
// 职责: CSV 文本 → 行校验 → 事务化批量落库
// 流程: 解析 → 逐行转换/处理 → 汇总 → 提交或整体回滚 → 回写任务
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod job_runner;
pub mod location_processor;
pub mod orchestrator;
pub mod output_sink;
pub mod row_coercer;
pub mod row_processor;
pub mod value_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult, InvalidValueError};
pub use file_parser::{CsvParser, ParsedCsv};
pub use job_runner::{CompletionCallback, ImportJobRunner, JobRun};
pub use location_processor::LocationProcessor;
pub use orchestrator::{HookFn, ImportHooks, ImportOrchestrator, ImportOrchestratorBuilder};
pub use output_sink::{DiscardSink, MemorySink, OutputSink, StdoutSink};
pub use row_coercer::{CoercedRow, CoercionConfig, ColumnSpec, RowCoercer};
pub use row_processor::{ImportArguments, RowContext, RowOutcome, RowProcessor};

// 重导出取值解析器
pub use value_parser::{
    BooleanParser, DateParser, DecimalParser, IntegerParser, NormalizedValue, TextParser,
    ValueParser, ZipCodeParser,
};
