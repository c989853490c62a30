// ==========================================
// 表格数据导入系统 - 导入领域实体
// ==========================================
// 职责: 行数据 / 行结果 / 批次结果 / 导入任务
// 红线: 结果对象创建后不可变,只在批次结束时汇总
// ==========================================

use crate::domain::types::{JobStatus, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Row - 单行原始数据
// ==========================================
// 有序的 (列名, 原始值) 序列; 同名列只保留首次出现的值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一列; 列名已存在时忽略并返回 false
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) -> bool {
        let header = header.into();
        if self.values.iter().any(|(h, _)| *h == header) {
            return false;
        }
        self.values.push((header, value.into()));
        true
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ==========================================
// RowResult - 行级导入结果
// ==========================================
// row_number: 文件逻辑行号（表头为第 1 行,首个数据行为第 2 行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowResult {
    pub row_number: usize,
    pub status: Outcome,
    pub errors: Vec<String>,
}

impl RowResult {
    /// 由错误列表推导状态: 无错误即成功
    pub fn new(row_number: usize, errors: Vec<String>) -> Self {
        let status = if errors.is_empty() {
            Outcome::Success
        } else {
            Outcome::Failure
        };
        Self {
            row_number,
            status,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 用于输出的单行错误描述: "Row 3: a, b"
    pub fn error_line(&self) -> String {
        format!("Row {}: {}", self.row_number, self.errors.join(", "))
    }
}

// ==========================================
// BatchResult - 批次导入结果
// ==========================================
// results 与 error 互斥: 行级失败填 results,运行中止填 error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub status: Outcome,
    pub results: Vec<RowResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    /// 汇总行结果: 任一行失败则批次失败
    pub fn from_rows(results: Vec<RowResult>) -> Self {
        let status = results
            .iter()
            .fold(Outcome::Success, |acc, r| acc.and(r.status));
        Self {
            status,
            results,
            error: None,
        }
    }

    /// 运行中止（无行级明细）
    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            status: Outcome::Failure,
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &RowResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// 实际落库的行数; 回滚后为 0
    pub fn imported_count(&self) -> usize {
        if self.is_success() {
            self.results.iter().filter(|r| r.is_success()).count()
        } else {
            0
        }
    }
}

// ==========================================
// ImportJob - 导入任务记录
// ==========================================
// 由任务存储持有; 导入核心只读取文件与标志位,并在结束时回写结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub job_id: String,
    pub file_name: Option<String>,
    pub file_contents: Vec<u8>,
    pub replace_existing: bool,
    pub process_in_background: bool,
    pub status: JobStatus,
    pub result: Option<BatchResult>,
    pub imported_count: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    pub fn new(file_name: Option<String>, file_contents: Vec<u8>) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            file_name,
            file_contents,
            replace_existing: false,
            process_in_background: false,
            status: JobStatus::Pending,
            result: None,
            imported_count: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// 以 UTF-8 读取文件内容
    pub fn read_file(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.file_contents)
    }

    pub fn processing_in_background(&self) -> bool {
        self.process_in_background
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}
