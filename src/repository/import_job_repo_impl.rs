// ==========================================
// 表格数据导入系统 - 导入任务 Repository 实现
// ==========================================
// 职责: 实现 import_job 表的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{BatchResult, ImportJob, JobStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_job_repo::JobStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

fn parse_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: "timestamp".to_string(),
            message: format!("{}: {}", raw, e),
        })
}

/// 数据库行的原始形态（时间与 JSON 字段延后解析）
struct JobRow {
    job_id: String,
    file_name: Option<String>,
    file_contents: Vec<u8>,
    replace_existing: bool,
    process_in_background: bool,
    status: String,
    result_json: Option<String>,
    imported_count: i64,
    created_at: String,
    finished_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            job_id: row.get(0)?,
            file_name: row.get(1)?,
            file_contents: row.get(2)?,
            replace_existing: row.get::<_, i64>(3)? != 0,
            process_in_background: row.get::<_, i64>(4)? != 0,
            status: row.get(5)?,
            result_json: row.get(6)?,
            imported_count: row.get(7)?,
            created_at: row.get(8)?,
            finished_at: row.get(9)?,
        })
    }

    fn into_job(self) -> RepositoryResult<ImportJob> {
        let result = match self.result_json {
            Some(json) => Some(serde_json::from_str::<BatchResult>(&json)?),
            None => None,
        };
        let finished_at = match self.finished_at {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };

        Ok(ImportJob {
            job_id: self.job_id,
            file_name: self.file_name,
            file_contents: self.file_contents,
            replace_existing: self.replace_existing,
            process_in_background: self.process_in_background,
            status: JobStatus::from_db(&self.status),
            result,
            imported_count: self.imported_count,
            created_at: parse_timestamp(&self.created_at)?,
            finished_at,
        })
    }
}

// ==========================================
// SqliteJobStore
// ==========================================
pub struct SqliteJobStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteJobStore {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn not_found(job_id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "ImportJob".to_string(),
            id: job_id.to_string(),
        }
    }
}

impl JobStore for SqliteJobStore {
    fn create(&self, job: &ImportJob) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let result_json = match &job.result {
            Some(result) => Some(serde_json::to_string(result)?),
            None => None,
        };

        conn.execute(
            r#"
            INSERT INTO import_job (
                job_id, file_name, file_contents, replace_existing, process_in_background,
                status, result_json, imported_count, created_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                job.job_id,
                job.file_name,
                job.file_contents,
                job.replace_existing as i32,
                job.process_in_background as i32,
                job.status.as_str(),
                result_json,
                job.imported_count,
                job.created_at.to_rfc3339(),
                job.finished_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    fn find(&self, job_id: &str) -> RepositoryResult<ImportJob> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                r#"
                SELECT job_id, file_name, file_contents, replace_existing, process_in_background,
                       status, result_json, imported_count, created_at, finished_at
                FROM import_job
                WHERE job_id = ?1
                "#,
                params![job_id],
                JobRow::from_row,
            )
            .optional()?;

        row.ok_or_else(|| Self::not_found(job_id))?.into_job()
    }

    fn save(
        &self,
        job_id: &str,
        status: JobStatus,
        result: &BatchResult,
        imported_count: usize,
    ) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let result_json = serde_json::to_string(result)?;

        let affected = conn.execute(
            "UPDATE import_job SET status = ?1, result_json = ?2, imported_count = ?3 WHERE job_id = ?4",
            params![status.as_str(), result_json, imported_count as i64, job_id],
        )?;

        if affected == 0 {
            return Err(Self::not_found(job_id));
        }
        Ok(())
    }

    fn mark_finished(&self, job_id: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;

        let affected = conn.execute(
            "UPDATE import_job SET finished_at = ?1 WHERE job_id = ?2",
            params![Utc::now().to_rfc3339(), job_id],
        )?;

        if affected == 0 {
            return Err(Self::not_found(job_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, RowResult};

    fn setup() -> SqliteJobStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        SqliteJobStore::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_create_and_find() {
        let store = setup();
        let mut job = ImportJob::new(Some("locations.csv".to_string()), b"Name\nDepot\n".to_vec());
        job.replace_existing = true;
        store.create(&job).unwrap();

        let found = store.find(&job.job_id).unwrap();
        assert_eq!(found.file_name.as_deref(), Some("locations.csv"));
        assert_eq!(found.read_file().unwrap(), "Name\nDepot\n");
        assert!(found.replace_existing);
        assert!(!found.process_in_background);
        assert_eq!(found.status, JobStatus::Pending);
        assert!(found.result.is_none());
        assert!(!found.is_finished());
    }

    #[test]
    fn test_find_missing() {
        let store = setup();
        let err = store.find("nope").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { ref id, .. } if id == "nope"));
    }

    #[test]
    fn test_save_and_mark_finished() {
        let store = setup();
        let job = ImportJob::new(None, b"Name\nDepot\n".to_vec());
        store.create(&job).unwrap();

        let result = BatchResult::from_rows(vec![RowResult::new(2, vec![])]);
        store.save(&job.job_id, JobStatus::Succeeded, &result, 1).unwrap();
        store.mark_finished(&job.job_id).unwrap();

        let found = store.find(&job.job_id).unwrap();
        assert_eq!(found.status, JobStatus::Succeeded);
        assert_eq!(found.imported_count, 1);
        assert_eq!(found.result.unwrap().status, Outcome::Success);
        assert!(found.finished_at.is_some());
    }

    #[test]
    fn test_save_missing_job() {
        let store = setup();
        let result = BatchResult::aborted("x");
        assert!(store.save("missing", JobStatus::Failed, &result, 0).is_err());
        assert!(store.mark_finished("missing").is_err());
    }
}
