//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve store configuration from the environment and open the store.
//! - Print a deterministic status summary for local sanity checks.

use log::error;
use record_store_core::db::migrations::current_version;
use record_store_core::{
    core_version, init_logging, open_store, ping, RecordRepository, SqliteRecordRepository,
    StoreConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={message}");
            eprintln!("record_store: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = open_store(&config).map_err(|err| err.to_string())?;
    let schema_version = current_version(&conn).map_err(|err| err.to_string())?;
    let repo = SqliteRecordRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let records = repo.count().map_err(|err| err.to_string())?;

    println!("record_store ping={}", ping());
    println!("record_store version={}", core_version());
    println!(
        "record_store db={}",
        config
            .db_path()
            .map_or_else(|| ":memory:".to_string(), |path| path.display().to_string())
    );
    println!("record_store schema_version={schema_version}");
    println!("record_store records={records}");
    Ok(())
}
