use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 测试用：单连接的内存 SQLite，已执行迁移
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connect_timeout_secs: 5,
        acquire_timeout_secs: 30,
    };
    let pool = create_pool(&config).await.expect("connect sqlite");
    run_migrations(&pool).await.expect("migrate sqlite");
    pool
}

/// 测试用：临时目录中的文件 SQLite，连接池内多个连接可以同时持有事务；
/// 写锁冲突时按 busy_timeout 等待
#[cfg(test)]
pub(crate) async fn shared_test_pool(max_connections: u32) -> (DbPool, tempfile::TempDir) {
    use sea_orm::SqlxSqliteConnector;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

    let dir = tempfile::tempdir().expect("create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("nashi-test.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(15));
    let sqlx_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .expect("open sqlite file");

    let pool = SqlxSqliteConnector::from_sqlx_sqlite_pool(sqlx_pool);
    run_migrations(&pool).await.expect("migrate sqlite");
    (pool, dir)
}
