// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供临时数据库初始化、站点表计数等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use tabular_import::db::{init_schema, open_sqlite_connection};
use tabular_import::importer::location_processor::create_location_table;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema + location 表
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path is not valid UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    create_location_table(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试库连接
pub fn open(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).expect("open test db")
}

/// 某组织下的站点数量
pub fn count_locations(conn: &Connection, organization_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM location WHERE organization_id = ?1",
        [organization_id],
        |row| row.get(0),
    )
    .expect("count locations")
}

/// 某组织下按名称排序的 (name, zip_code)
pub fn list_locations(conn: &Connection, organization_id: i64) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT name, zip_code FROM location WHERE organization_id = ?1 ORDER BY name")
        .expect("prepare");
    stmt.query_map([organization_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect")
}

/// 预置一条站点记录
pub fn insert_location(conn: &Connection, organization_id: i64, name: &str) {
    conn.execute(
        "INSERT INTO location (organization_id, name, zip_code) VALUES (?1, ?2, '00000')",
        rusqlite::params![organization_id, name],
    )
    .expect("insert location");
}

/// 标准站点 CSV
pub const LOCATIONS_CSV: &str = "\
Name,Street,City,State,Zip,Capacity,Active
North Depot,1 Main St,Springfield,IL,627,40,yes
South Depot,9 Elm St,Springfield,IL,62704-1234,25,no
East Yard,,Shelbyville,IL,62565,,true
";
