// ==========================================
// 表格数据导入系统 - 领域类型定义
// ==========================================
// 职责: 导入结果状态、导入运行状态机、导入任务状态
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入结果 (Outcome)
// ==========================================
// 行级结果与批次结果共用
// 序列化为 "SUCCESS" / "ERROR"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// 合并两个结果: 任一失败即失败
    pub fn and(self, other: Outcome) -> Outcome {
        if self.is_success() && other.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "ERROR",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 导入运行状态 (Import State)
// ==========================================
// INITIALIZED → RUNNING → {COMMITTED, ROLLED_BACK, FAILED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportState {
    Initialized, // 已构造,未运行
    Running,     // 事务进行中
    Committed,   // 全部行成功,已提交
    RolledBack,  // 存在行级错误,已回滚
    Failed,      // 基础设施/意外错误,已回滚
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportState::Initialized => write!(f, "INITIALIZED"),
            ImportState::Running => write!(f, "RUNNING"),
            ImportState::Committed => write!(f, "COMMITTED"),
            ImportState::RolledBack => write!(f, "ROLLED_BACK"),
            ImportState::Failed => write!(f, "FAILED"),
        }
    }
}

// ==========================================
// 导入任务状态 (Job Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,   // 已创建,等待执行
    Succeeded, // 导入成功
    Failed,    // 导入失败
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// 从数据库字符串解析（未知值按 PENDING 处理）
    pub fn from_db(raw: &str) -> JobStatus {
        match raw.trim() {
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

impl From<Outcome> for JobStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => JobStatus::Succeeded,
            Outcome::Failure => JobStatus::Failed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
