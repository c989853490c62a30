// ==========================================
// 导入任务集成测试
// ==========================================
// 测试目标: 任务记录读取、后台执行回写、前台执行不回写
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};
use tabular_import::domain::{BatchResult, ImportJob, JobStatus, Outcome};
use tabular_import::importer::location_processor::{clear_locations, ORGANIZATION_ID};
use tabular_import::importer::{
    ImportError, ImportJobRunner, ImportOrchestrator, ImportOrchestratorBuilder, LocationProcessor,
    MemorySink,
};
use tabular_import::logging;
use tabular_import::{JobStore, SqliteJobStore};
use test_helpers::{count_locations, create_test_db, open, LOCATIONS_CSV};

fn create_job(store: &Arc<dyn JobStore>, csv: &str, background: bool) -> ImportJob {
    let mut job = ImportJob::new(Some("locations.csv".to_string()), csv.as_bytes().to_vec());
    job.process_in_background = background;
    store.create(&job).expect("create job");
    job
}

fn job_import(
    store: &Arc<dyn JobStore>,
    job_id: &str,
    sink: &MemorySink,
) -> ImportOrchestratorBuilder {
    ImportOrchestrator::builder(LocationProcessor::new())
        .job(store.clone(), job_id)
        .argument(ORGANIZATION_ID, "1")
        .destroy_existing(clear_locations(1))
        .sink(sink.clone())
}

#[tokio::test]
async fn test_background_job_writes_back_result() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());
    let job = create_job(&store, LOCATIONS_CSV, true);

    let callback_seen: Arc<Mutex<Option<BatchResult>>> = Arc::new(Mutex::new(None));
    let seen = callback_seen.clone();

    let runner = ImportJobRunner::new(db_path.clone());
    let run = runner
        .start(
            job_import(&store, &job.job_id, &MemorySink::new()),
            Some(Box::new(move |result: &BatchResult| {
                *seen.lock().unwrap() = Some(result.clone());
            })),
        )
        .unwrap();
    assert!(run.is_background());

    let result = run.wait().await.unwrap();
    assert_eq!(result.status, Outcome::Success);
    assert_eq!(callback_seen.lock().unwrap().as_ref(), Some(&result));

    let stored = store.find(&job.job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Succeeded);
    assert_eq!(stored.imported_count, 3);
    assert_eq!(stored.result, Some(result));
    assert!(stored.is_finished());
    assert_eq!(count_locations(&open(&db_path), 1), 3);
}

#[tokio::test]
async fn test_background_job_failure_is_recorded() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());
    let job = create_job(&store, "Name,Zip\nA,12345\n,99999\n", true);

    let result = ImportJobRunner::new(db_path.clone())
        .start(job_import(&store, &job.job_id, &MemorySink::new()), None)
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(result.status, Outcome::Failure);
    let stored = store.find(&job.job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.imported_count, 0);
    assert_eq!(
        stored.result.as_ref().map(|r| r.failed_rows().count()),
        Some(1)
    );
    assert!(stored.finished_at.is_some());
    assert_eq!(count_locations(&open(&db_path), 1), 0);
}

#[tokio::test]
async fn test_foreground_job_runs_inline_without_write_back() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());
    let job = create_job(&store, LOCATIONS_CSV, false);
    let sink = MemorySink::new();

    let run = ImportJobRunner::new(db_path.clone())
        .start(job_import(&store, &job.job_id, &sink), None)
        .unwrap();
    assert!(!run.is_background());

    let result = run.wait().await.unwrap();
    assert!(result.is_success());
    assert!(sink.messages().contains(&"Starting import".to_string()));

    // 前台执行由调用方负责持久化
    let stored = store.find(&job.job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert!(stored.finished_at.is_none());
}

#[test]
fn test_unknown_job_id_fails_to_build() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());

    let err = job_import(&store, "no-such-job", &MemorySink::new())
        .build()
        .err()
        .expect("unknown job must fail");
    assert!(matches!(err, ImportError::JobNotFound(ref id) if id == "no-such-job"));
}

#[test]
fn test_job_with_invalid_utf8_fails_to_build() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());
    let job = ImportJob::new(None, vec![0xff, 0xfe, 0x00]);
    store.create(&job).unwrap();

    let err = job_import(&store, &job.job_id, &MemorySink::new())
        .build()
        .err()
        .expect("binary contents must fail");
    assert!(matches!(err, ImportError::InvalidJobFile(_)));
}

#[test]
fn test_background_without_runtime_is_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path).unwrap());
    let job = create_job(&store, LOCATIONS_CSV, true);

    let err = ImportJobRunner::new(db_path.clone())
        .start(job_import(&store, &job.job_id, &MemorySink::new()), None)
        .err()
        .expect("no runtime");
    assert!(matches!(err, ImportError::Internal(_)));
    assert_eq!(store.find(&job.job_id).unwrap().status, JobStatus::Pending);
}
