// ==========================================
// 表格数据导入系统 - 取值解析器
// ==========================================
// 职责: 单列原始字符串 → 标准化取值 + 校验
// 约定: 所有解析器共用同一入口 parse(raw, key),由行转换器统一调用
// 错误信息模板: "Invalid value for column: <key>. <提示>"
// ==========================================

use crate::importer::error::InvalidValueError;
use chrono::NaiveDate;
use rusqlite::types::{Null, ToSql, ToSqlOutput};
use serde::Serialize;
use std::fmt;

// ==========================================
// NormalizedValue - 标准化取值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Boolean(bool),
    Null,
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Text(s) => write!(f, "{}", s),
            NormalizedValue::Integer(i) => write!(f, "{}", i),
            NormalizedValue::Decimal(d) => write!(f, "{}", d),
            NormalizedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            NormalizedValue::Boolean(b) => write!(f, "{}", b),
            NormalizedValue::Null => Ok(()),
        }
    }
}

// 日期统一以 YYYY-MM-DD 文本落库
impl ToSql for NormalizedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            NormalizedValue::Text(s) => ToSqlOutput::from(s.as_str()),
            NormalizedValue::Integer(i) => ToSqlOutput::from(*i),
            NormalizedValue::Decimal(d) => ToSqlOutput::from(*d),
            NormalizedValue::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
            NormalizedValue::Boolean(b) => ToSqlOutput::from(*b),
            NormalizedValue::Null => ToSqlOutput::from(Null),
        })
    }
}

// ==========================================
// ValueParser Trait
// ==========================================
// 实现者: ZipCodeParser / TextParser / IntegerParser / DecimalParser / DateParser / BooleanParser
pub trait ValueParser: Send + Sync {
    /// 解析单列原始值
    ///
    /// # 参数
    /// - raw: 原始字符串
    /// - key: 来源列名（用于错误信息）
    ///
    /// # 返回
    /// - Ok(NormalizedValue): 标准化后的取值
    /// - Err(InvalidValueError): 取值不符合该类型规则
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError>;
}

fn invalid(key: &str, hint: &str) -> InvalidValueError {
    InvalidValueError::new(key, format!("Invalid value for column: {}. {}", key, hint))
}

// ==========================================
// ZipCodeParser - 邮编类取值
// ==========================================
// 规则:
// 1. 去掉所有 '-'
// 2. 剩余字符必须全部为数字（空串视为通过）
// 3. 去横线后恰好 9 位 → 原样返回（保留横线）
// 4. 否则左侧补 '0' 至至少 5 位
pub struct ZipCodeParser;

impl ValueParser for ZipCodeParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let digits: String = raw.chars().filter(|c| *c != '-').collect();

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(
                key,
                "Value should contain only numbers or a dash.",
            ));
        }

        if digits.len() == 9 {
            return Ok(NormalizedValue::Text(raw.to_string()));
        }

        Ok(NormalizedValue::Text(format!("{:0>5}", digits)))
    }
}

// ==========================================
// TextParser - 文本取值（TRIM）
// ==========================================
pub struct TextParser {
    pub required: bool,
}

impl TextParser {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

impl ValueParser for TextParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if self.required {
                return Err(invalid(key, "Value is required."));
            }
            return Ok(NormalizedValue::Null);
        }
        Ok(NormalizedValue::Text(trimmed.to_string()))
    }
}

// ==========================================
// IntegerParser - 整数取值
// ==========================================
pub struct IntegerParser;

impl ValueParser for IntegerParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NormalizedValue::Null);
        }
        trimmed
            .parse::<i64>()
            .map(NormalizedValue::Integer)
            .map_err(|_| invalid(key, "Value should be a whole number."))
    }
}

// ==========================================
// DecimalParser - 浮点取值
// ==========================================
pub struct DecimalParser;

impl ValueParser for DecimalParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NormalizedValue::Null);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(NormalizedValue::Decimal(v)),
            _ => Err(invalid(key, "Value should be a number.")),
        }
    }
}

// ==========================================
// DateParser - 日期取值
// ==========================================
// 支持 YYYYMMDD / YYYY-MM-DD
pub struct DateParser;

impl ValueParser for DateParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NormalizedValue::Null);
        }
        NaiveDate::parse_from_str(trimmed, "%Y%m%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .map(NormalizedValue::Date)
            .map_err(|_| invalid(key, "Value should be a date (YYYY-MM-DD)."))
    }
}

// ==========================================
// BooleanParser - 是/否取值
// ==========================================
pub struct BooleanParser;

impl ValueParser for BooleanParser {
    fn parse(&self, raw: &str, key: &str) -> Result<NormalizedValue, InvalidValueError> {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "" => Ok(NormalizedValue::Null),
            "1" | "Y" | "YES" | "TRUE" => Ok(NormalizedValue::Boolean(true)),
            "0" | "N" | "NO" | "FALSE" => Ok(NormalizedValue::Boolean(false)),
            _ => Err(invalid(key, "Value should be yes or no.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zip(raw: &str) -> Result<NormalizedValue, InvalidValueError> {
        ZipCodeParser.parse(raw, "Zip")
    }

    fn text(v: &str) -> NormalizedValue {
        NormalizedValue::Text(v.to_string())
    }

    #[test]
    fn test_zip_nine_plain_digits_unchanged() {
        assert_eq!(zip("123456789").unwrap(), text("123456789"));
    }

    #[test]
    fn test_zip_nine_digits_keeps_dashes() {
        assert_eq!(zip("12345-6789").unwrap(), text("12345-6789"));
        // 9 位数字,横线位置不限
        assert_eq!(zip("1-2345678-9").unwrap(), text("1-2345678-9"));
    }

    #[test]
    fn test_zip_short_values_are_padded() {
        assert_eq!(zip("123").unwrap(), text("00123"));
        assert_eq!(zip("12-3").unwrap(), text("00123"));
        assert_eq!(zip("12345").unwrap(), text("12345"));
    }

    #[test]
    fn test_zip_other_lengths_use_stripped_value() {
        // 超过 5 位但非 9 位: 不截断,去掉横线
        assert_eq!(zip("1234-567").unwrap(), text("1234567"));
    }

    #[test]
    fn test_zip_empty_pads_to_zeros() {
        assert_eq!(zip("").unwrap(), text("00000"));
        assert_eq!(zip("--").unwrap(), text("00000"));
    }

    #[test]
    fn test_zip_rejects_non_digits() {
        let err = zip("12a45").unwrap_err();
        assert_eq!(err.key, "Zip");
        assert_eq!(
            err.message,
            "Invalid value for column: Zip. Value should contain only numbers or a dash."
        );
        assert!(zip(" 12345").is_err());
    }

    #[test]
    fn test_text_parser() {
        assert_eq!(TextParser::optional().parse("  hi ", "Name").unwrap(), text("hi"));
        assert_eq!(TextParser::optional().parse("  ", "Name").unwrap(), NormalizedValue::Null);
        let err = TextParser::required().parse(" ", "Name").unwrap_err();
        assert_eq!(err.message, "Invalid value for column: Name. Value is required.");
    }

    #[test]
    fn test_integer_parser() {
        assert_eq!(IntegerParser.parse(" 42 ", "Capacity").unwrap(), NormalizedValue::Integer(42));
        assert_eq!(IntegerParser.parse("", "Capacity").unwrap(), NormalizedValue::Null);
        assert!(IntegerParser.parse("4.2", "Capacity").is_err());
    }

    #[test]
    fn test_decimal_parser() {
        assert_eq!(DecimalParser.parse("2.5", "Weight").unwrap(), NormalizedValue::Decimal(2.5));
        assert!(DecimalParser.parse("NaN", "Weight").is_err());
        assert!(DecimalParser.parse("abc", "Weight").is_err());
    }

    #[test]
    fn test_date_parser_formats() {
        let expected = NormalizedValue::Date(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(DateParser.parse("20250120", "Opened").unwrap(), expected);
        assert_eq!(DateParser.parse("2025-01-20", "Opened").unwrap(), expected);
        assert!(DateParser.parse("01/20/2025", "Opened").is_err());
    }

    #[test]
    fn test_boolean_parser() {
        assert_eq!(BooleanParser.parse("yes", "Active").unwrap(), NormalizedValue::Boolean(true));
        assert_eq!(BooleanParser.parse("0", "Active").unwrap(), NormalizedValue::Boolean(false));
        assert_eq!(BooleanParser.parse("", "Active").unwrap(), NormalizedValue::Null);
        assert!(BooleanParser.parse("maybe", "Active").is_err());
    }

    #[test]
    fn test_display_and_sql() {
        let date = NormalizedValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(date.to_string(), "2024-02-29");
        assert_eq!(NormalizedValue::Null.to_string(), "");
        assert!(date.to_sql().is_ok());
    }
}
