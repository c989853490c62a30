// ==========================================
// 表格数据导入系统 - 行处理扩展点
// ==========================================
// 职责: 定义每种导入类型需实现的行处理接口
// 约定:
// - 行处理在编排器持有的事务内执行,只借用事务,不得持有
// - 业务错误通过 RowOutcome 返回; 抛出的错误由编排器捕获并并入该行结果
// ==========================================

use crate::domain::Row;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::Transaction;
use std::collections::BTreeMap;

// ==========================================
// ImportArguments - 命名构造参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportArguments {
    values: BTreeMap<String, String>,
}

impl ImportArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// 返回缺失的必填参数（空白值视为缺失）
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|key| self.get(key).map_or(true, |v| v.trim().is_empty()))
            .map(|key| key.to_string())
            .collect()
    }
}

// ==========================================
// RowContext - 行处理上下文
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    /// 文件逻辑行号（首个数据行为 2）
    pub row_number: usize,
    pub arguments: &'a ImportArguments,
    pub replace_existing: bool,
}

// ==========================================
// RowOutcome - 行处理结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOutcome {
    pub errors: Vec<String>,
}

impl RowOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_errors(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

// ==========================================
// RowProcessor Trait
// ==========================================
// 实现者: LocationProcessor 等具体导入类型
pub trait RowProcessor: Send {
    /// 实现类型名（用于配置错误与日志）
    fn type_name(&self) -> &str;

    /// 构造时必须提供的参数
    fn required_arguments(&self) -> &[&'static str] {
        &[]
    }

    /// 处理单行
    ///
    /// # 返回
    /// - Ok(RowOutcome): 含业务错误（可为空）
    /// - Err: 抛出的错误; NotImplemented 会中止整批,其余记为该行错误
    fn process(
        &mut self,
        _tx: &Transaction<'_>,
        _ctx: &RowContext<'_>,
        _row: &Row,
        _headers: &[String],
    ) -> ImportResult<RowOutcome> {
        Err(ImportError::NotImplemented(self.type_name().to_string()))
    }
}
