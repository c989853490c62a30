// ==========================================
// 表格数据导入系统 - 行转换器
// ==========================================
// 职责: 按列配置对一行逐列调用取值解析器
// 规则: 不短路,所有列都尝试解析,一行可产生多条错误
// 约束: 各列独立,不做跨列校验
// ==========================================

use crate::domain::Row;
use crate::importer::value_parser::{NormalizedValue, ValueParser};
use std::collections::BTreeMap;

// ==========================================
// ColumnSpec - 列配置
// ==========================================
// key: CSV 列名; field: 目标字段名
pub struct ColumnSpec {
    pub key: String,
    pub field: String,
    pub parser: Box<dyn ValueParser>,
}

impl ColumnSpec {
    pub fn new(
        key: impl Into<String>,
        field: impl Into<String>,
        parser: impl ValueParser + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            parser: Box::new(parser),
        }
    }
}

// ==========================================
// CoercionConfig - 行转换配置
// ==========================================
// 单次导入期间不变; 列顺序决定错误信息顺序
pub struct CoercionConfig {
    columns: Vec<ColumnSpec>,
    missing_value: String,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CoercionConfig {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            missing_value: String::new(),
        }
    }

    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    /// 行中缺少该列时使用的原始值（默认空串）
    pub fn missing_value(mut self, value: impl Into<String>) -> Self {
        self.missing_value = value.into();
        self
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn find(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }
}

// ==========================================
// CoercedRow - 行转换结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedRow {
    pub fields: BTreeMap<String, NormalizedValue>,
    pub errors: Vec<String>,
}

impl CoercedRow {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&NormalizedValue> {
        self.fields.get(field)
    }

    /// 取字段值,缺失时返回 Null（用于落库参数）
    pub fn value(&self, field: &str) -> &NormalizedValue {
        static NULL: NormalizedValue = NormalizedValue::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }
}

pub struct RowCoercer;

impl RowCoercer {
    /// 转换单行
    ///
    /// # 参数
    /// - row: 原始行（列名 → 原始值）
    /// - config: 列配置
    ///
    /// # 返回
    /// - CoercedRow: 成功列进入 fields,失败列的错误信息按列顺序进入 errors
    pub fn coerce(row: &Row, config: &CoercionConfig) -> CoercedRow {
        let mut coerced = CoercedRow::default();

        for spec in &config.columns {
            let raw = row.get(&spec.key).unwrap_or(config.missing_value.as_str());
            match spec.parser.parse(raw, &spec.key) {
                Ok(value) => {
                    coerced.fields.insert(spec.field.clone(), value);
                }
                Err(e) => coerced.errors.push(e.message),
            }
        }

        coerced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::value_parser::{IntegerParser, TextParser, ZipCodeParser};

    fn config() -> CoercionConfig {
        CoercionConfig::new()
            .column(ColumnSpec::new("Name", "name", TextParser::required()))
            .column(ColumnSpec::new("Zip", "zip_code", ZipCodeParser))
            .column(ColumnSpec::new("Capacity", "capacity", IntegerParser))
    }

    #[test]
    fn test_coerce_all_valid() {
        let row: Row = vec![("Name", "Depot"), ("Zip", "123"), ("Capacity", "40")]
            .into_iter()
            .collect();

        let coerced = RowCoercer::coerce(&row, &config());

        assert!(coerced.is_valid());
        assert_eq!(coerced.get("name"), Some(&NormalizedValue::Text("Depot".to_string())));
        assert_eq!(coerced.get("zip_code"), Some(&NormalizedValue::Text("00123".to_string())));
        assert_eq!(coerced.get("capacity"), Some(&NormalizedValue::Integer(40)));
    }

    #[test]
    fn test_coerce_collects_every_error_in_column_order() {
        let row: Row = vec![("Name", ""), ("Zip", "12a45"), ("Capacity", "lots")]
            .into_iter()
            .collect();

        let coerced = RowCoercer::coerce(&row, &config());

        assert!(!coerced.is_valid());
        assert_eq!(coerced.errors.len(), 3);
        assert!(coerced.errors[0].contains("column: Name"));
        assert!(coerced.errors[1].contains("column: Zip"));
        assert!(coerced.errors[2].contains("column: Capacity"));
        assert!(coerced.fields.is_empty());
    }

    #[test]
    fn test_coerce_partial_failure_keeps_other_fields() {
        let row: Row = vec![("Name", "Depot"), ("Zip", "x"), ("Capacity", "1")]
            .into_iter()
            .collect();

        let coerced = RowCoercer::coerce(&row, &config());

        assert_eq!(coerced.errors.len(), 1);
        assert_eq!(coerced.fields.len(), 2);
        assert!(coerced.get("zip_code").is_none());
    }

    #[test]
    fn test_missing_column_uses_default() {
        let row: Row = vec![("Name", "Depot")].into_iter().collect();

        let coerced = RowCoercer::coerce(&row, &config());

        assert!(coerced.is_valid());
        assert_eq!(coerced.value("zip_code"), &NormalizedValue::Text("00000".to_string()));
        assert_eq!(coerced.value("capacity"), &NormalizedValue::Null);
    }

    #[test]
    fn test_missing_value_override() {
        let row = Row::new();
        let config = CoercionConfig::new()
            .column(ColumnSpec::new("Capacity", "capacity", IntegerParser))
            .missing_value("0");

        let coerced = RowCoercer::coerce(&row, &config);

        assert_eq!(coerced.value("capacity"), &NormalizedValue::Integer(0));
        assert!(config.find("Capacity").is_some());
        assert!(config.find("Zip").is_none());
    }
}
