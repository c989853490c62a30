// ==========================================
// 表格数据导入系统 - CSV 解析器
// ==========================================
// 职责: 原始文本 → 表头列表 + 有序行记录
// 规则:
// - 首行为表头; 空白表头丢弃,重复表头只保留首次出现
// - 完全空白的行跳过
// - 行长度允许不一致（flexible）
// ==========================================

use crate::config::ImportSettings;
use crate::domain::Row;
use crate::importer::error::ImportResult;
use csv::ReaderBuilder;
use std::path::Path;

/// 解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedCsv {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser {
    delimiter: u8,
    trim_values: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim_values: true,
        }
    }
}

impl CsvParser {
    pub fn new(delimiter: u8, trim_values: bool) -> Self {
        Self {
            delimiter,
            trim_values,
        }
    }

    pub fn from_settings(settings: &ImportSettings) -> Self {
        Self::new(settings.delimiter, settings.trim_values)
    }

    /// 解析 CSV 文本
    ///
    /// # 返回
    /// - Ok(ParsedCsv): 表头 + 数据行（可能为空,由调用方判断）
    /// - Err: CSV 语法错误 / 编码错误
    pub fn parse_text(&self, text: &str) -> ImportResult<ParsedCsv> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        // 按列位置保留原始表头（空白表头为 None）
        let raw_headers: Vec<Option<String>> = reader
            .headers()?
            .iter()
            .map(|h| {
                let h = h.trim();
                if h.is_empty() {
                    None
                } else {
                    Some(h.to_string())
                }
            })
            .collect();

        let mut headers: Vec<String> = Vec::new();
        for header in raw_headers.iter().flatten() {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = Row::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(Some(header)) = raw_headers.get(col_idx) {
                    let value = if self.trim_values { value.trim() } else { value };
                    row.insert(header.clone(), value);
                }
            }

            // 跳过完全空白的行
            if row.iter().all(|(_, v)| v.trim().is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(ParsedCsv { headers, rows })
    }

    /// 读取并解析 CSV 文件
    pub fn parse_file(&self, path: &Path) -> ImportResult<ParsedCsv> {
        let text = std::fs::read_to_string(path)?;
        self.parse_text(&text)
    }
}
