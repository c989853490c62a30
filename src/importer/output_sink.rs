// ==========================================
// 表格数据导入系统 - 导入进度输出
// ==========================================
// 职责: 接收导入过程中的提示信息（开始/结束/成功/回滚明细）
// 实现者: DiscardSink（默认） / StdoutSink（命令行） / MemorySink（测试与回显）
// 后台模式的日志镜像由编排器负责,sink 本身不写日志
// ==========================================

use std::sync::{Arc, Mutex};

pub trait OutputSink: Send {
    fn write(&mut self, message: &str);
}

/// 丢弃全部提示
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl OutputSink for DiscardSink {
    fn write(&mut self, _message: &str) {}
}

/// 输出到标准输出
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// 内存收集; clone 共享同一缓冲区
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
