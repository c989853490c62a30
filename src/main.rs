// ==========================================
// 表格数据导入系统 - 命令行入口
// ==========================================
// 用法:
//   tabular-import <db_path> <csv_path> <organization_id> [--replace] [--background]
//
// 未指定 --background 时,按大文件阈值自动选择前台/后台执行
// ==========================================

use std::path::Path;
use std::sync::Arc;
use tabular_import::config::{ConfigManager, ImportConfigReader};
use tabular_import::db::{init_schema, open_sqlite_connection};
use tabular_import::importer::location_processor::{
    clear_locations, create_location_table, ORGANIZATION_ID,
};
use tabular_import::importer::{ImportJobRunner, ImportOrchestrator, LocationProcessor, StdoutSink};
use tabular_import::logging;
use tabular_import::{BatchResult, ImportJob, JobStore, SqliteJobStore};

const USAGE: &str =
    "usage: tabular-import <db_path> <csv_path> <organization_id> [--replace] [--background]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut positional = Vec::new();
    let mut replace = false;
    let mut force_background = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--replace" => replace = true,
            "--background" => force_background = true,
            _ => positional.push(arg),
        }
    }

    let (db_path, csv_path, organization_id) = match positional.as_slice() {
        [db, csv, org] => (db.clone(), csv.clone(), org.trim().parse::<i64>()?),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    // 初始化表结构
    {
        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        create_location_table(&conn)?;
    }

    // 加载配置 + 初始化日志系统
    let settings = ConfigManager::new(&db_path)?.load_settings()?;
    logging::init(settings.log_format);

    tracing::info!("==================================================");
    tracing::info!("表格数据导入系统 v{}", tabular_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let contents = std::fs::read(&csv_path)?;
    let file_name = Path::new(&csv_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    // 大文件转后台
    let background = force_background || {
        let preview = ImportOrchestrator::builder(LocationProcessor::new())
            .text(String::from_utf8_lossy(&contents).to_string())
            .argument(ORGANIZATION_ID, organization_id.to_string())
            .settings(settings.clone())
            .build()?;
        preview.big_file()?
    };

    let store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(&db_path)?);
    let mut job = ImportJob::new(file_name, contents);
    job.replace_existing = replace;
    job.process_in_background = background;
    store.create(&job)?;
    tracing::info!(job_id = %job.job_id, background, "导入任务已创建");

    let builder = ImportOrchestrator::builder(LocationProcessor::new())
        .job(store.clone(), job.job_id.clone())
        .argument(ORGANIZATION_ID, organization_id.to_string())
        .destroy_existing(clear_locations(organization_id))
        .sink(StdoutSink)
        .settings(settings);

    let runner = ImportJobRunner::new(db_path.clone());
    let run = runner.start(
        builder,
        Some(Box::new(|result: &BatchResult| {
            tracing::info!(status = %result.status, "导入任务完成");
        })),
    )?;
    let result = run.wait().await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
