// ==========================================
// 表格数据导入系统 - 站点导入
// ==========================================
// 职责: 站点 CSV 行 → location 表
// 列映射:
//   Name → name (必填) / Street / City / State → 文本
//   Zip → zip_code (邮编规则) / Capacity → 整数 / Active → 是否
// 必填参数: organization_id
// 替换模式: 清空该组织下的全部站点
// ==========================================

use crate::domain::Row;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_coercer::{CoercionConfig, ColumnSpec, RowCoercer};
use crate::importer::row_processor::{RowContext, RowOutcome, RowProcessor};
use crate::importer::value_parser::{BooleanParser, IntegerParser, TextParser, ZipCodeParser};
use rusqlite::{params, Connection, Transaction};

pub const ORGANIZATION_ID: &str = "organization_id";

/// 创建 location 表（幂等）
pub fn create_location_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS location (
            location_id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            street TEXT,
            city TEXT,
            state TEXT,
            zip_code TEXT NOT NULL,
            capacity INTEGER,
            active INTEGER,
            UNIQUE(organization_id, name)
        );
        "#,
    )
}

/// 替换模式钩子: 删除该组织下的全部站点
pub fn clear_locations(
    organization_id: i64,
) -> impl FnMut(&Transaction<'_>) -> ImportResult<()> + Send + 'static {
    move |tx: &Transaction<'_>| {
        let deleted = tx.execute(
            "DELETE FROM location WHERE organization_id = ?1",
            params![organization_id],
        )?;
        tracing::debug!(organization_id, deleted, "已清空旧站点");
        Ok(())
    }
}

fn parse_organization_id(raw: &str) -> ImportResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| ImportError::Configuration {
        type_name: "LocationProcessor".to_string(),
        missing: vec![format!("{} (integer, got '{}')", ORGANIZATION_ID, raw)],
    })
}

// ==========================================
// LocationProcessor
// ==========================================
pub struct LocationProcessor {
    columns: CoercionConfig,
}

impl Default for LocationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProcessor {
    pub fn new() -> Self {
        let columns = CoercionConfig::new()
            .column(ColumnSpec::new("Name", "name", TextParser::required()))
            .column(ColumnSpec::new("Street", "street", TextParser::optional()))
            .column(ColumnSpec::new("City", "city", TextParser::optional()))
            .column(ColumnSpec::new("State", "state", TextParser::optional()))
            .column(ColumnSpec::new("Zip", "zip_code", ZipCodeParser))
            .column(ColumnSpec::new("Capacity", "capacity", IntegerParser))
            .column(ColumnSpec::new("Active", "active", BooleanParser));

        Self { columns }
    }
}

impl RowProcessor for LocationProcessor {
    fn type_name(&self) -> &str {
        "LocationProcessor"
    }

    fn required_arguments(&self) -> &[&'static str] {
        &[ORGANIZATION_ID]
    }

    fn process(
        &mut self,
        tx: &Transaction<'_>,
        ctx: &RowContext<'_>,
        row: &Row,
        _headers: &[String],
    ) -> ImportResult<RowOutcome> {
        let coerced = RowCoercer::coerce(row, &self.columns);
        if !coerced.is_valid() {
            return Ok(RowOutcome::with_errors(coerced.errors));
        }

        let organization_id = parse_organization_id(ctx.arguments.get(ORGANIZATION_ID).unwrap_or(""))?;

        tx.execute(
            r#"
            INSERT INTO location (organization_id, name, street, city, state, zip_code, capacity, active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                organization_id,
                coerced.value("name"),
                coerced.value("street"),
                coerced.value("city"),
                coerced.value("state"),
                coerced.value("zip_code"),
                coerced.value("capacity"),
                coerced.value("active"),
            ],
        )?;

        Ok(RowOutcome::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::row_processor::ImportArguments;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_location_table(&conn).unwrap();
        conn
    }

    fn run_row(conn: &mut Connection, args: &ImportArguments, row: &Row) -> ImportResult<RowOutcome> {
        let tx = conn.transaction().unwrap();
        let ctx = RowContext {
            row_number: 2,
            arguments: args,
            replace_existing: false,
        };
        let outcome = LocationProcessor::new().process(&tx, &ctx, row, &[]);
        tx.commit().unwrap();
        outcome
    }

    #[test]
    fn test_valid_row_inserted() {
        let mut conn = setup();
        let args = ImportArguments::new().with(ORGANIZATION_ID, "7");
        let row: Row = vec![
            ("Name", "North Depot"),
            ("City", "Springfield"),
            ("Zip", "123"),
            ("Capacity", "40"),
            ("Active", "yes"),
        ]
        .into_iter()
        .collect();

        let outcome = run_row(&mut conn, &args, &row).unwrap();
        assert!(outcome.errors.is_empty());

        let (zip, capacity, active, street): (String, i64, bool, Option<String>) = conn
            .query_row(
                "SELECT zip_code, capacity, active, street FROM location WHERE organization_id = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!(zip, "00123");
        assert_eq!(capacity, 40);
        assert!(active);
        assert_eq!(street, None);
    }

    #[test]
    fn test_invalid_row_reports_each_column() {
        let mut conn = setup();
        let args = ImportArguments::new().with(ORGANIZATION_ID, "7");
        let row: Row = vec![("Name", ""), ("Zip", "12a45"), ("Capacity", "x")]
            .into_iter()
            .collect();

        let outcome = run_row(&mut conn, &args, &row).unwrap();

        assert_eq!(outcome.errors.len(), 3);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM location", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_duplicate_name_raises() {
        let mut conn = setup();
        let args = ImportArguments::new().with(ORGANIZATION_ID, "7");
        let row: Row = vec![("Name", "Depot")].into_iter().collect();

        run_row(&mut conn, &args, &row).unwrap();
        let err = run_row(&mut conn, &args, &row).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_clear_locations_scoped_to_organization() {
        let mut conn = setup();
        conn.execute(
            "INSERT INTO location (organization_id, name, zip_code) VALUES (1, 'a', '00001'), (2, 'b', '00002')",
            [],
        )
        .unwrap();

        let tx = conn.transaction().unwrap();
        let mut hook = clear_locations(1);
        hook(&tx).unwrap();
        tx.commit().unwrap();

        let remaining: Vec<i64> = conn
            .prepare("SELECT organization_id FROM location")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(remaining, vec![2]);
    }

    #[test]
    fn test_non_numeric_organization_rejected() {
        assert!(parse_organization_id("abc").is_err());
        assert_eq!(parse_organization_id(" 12 ").unwrap(), 12);
    }
}
