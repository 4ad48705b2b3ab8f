use crate::entities::app_setting_entity as app_settings;
use crate::error::{AppError, AppResult};
use crate::models::{PointsConfig, UpdatePointsConfigRequest};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};

/// 积分配置 (key/value)
///
/// 首次读取时通过 `INSERT .. ON CONFLICT (key) DO NOTHING` 写入默认值，
/// 并发的首次读取不会产生重复记录。
#[derive(Clone)]
pub struct SettingsService {
    pool: DatabaseConnection,
}

impl SettingsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 读取当前配置（不存在则按默认值创建）
    pub async fn get_config(&self) -> AppResult<PointsConfig> {
        Self::ensure_defaults(&self.pool).await?;
        Ok(Self::read_config(&self.pool).await?)
    }

    /// 部分更新配置，未提供的字段保持不变
    pub async fn update_config(&self, request: UpdatePointsConfigRequest) -> AppResult<PointsConfig> {
        let entries = request.entries();
        if let Some((key, _)) = entries.iter().find(|(_, value)| *value < 0) {
            return Err(AppError::ValidationError(format!(
                "{key} must not be negative"
            )));
        }

        let txn = self.pool.begin().await?;
        Self::ensure_defaults(&txn).await?;

        let now = Utc::now();
        for (key, value) in &entries {
            app_settings::Entity::insert(app_settings::ActiveModel {
                key: Set(key.to_string()),
                value: Set(*value),
                updated_at: Set(Some(now)),
            })
            .on_conflict(
                OnConflict::column(app_settings::Column::Key)
                    .update_columns([app_settings::Column::Value, app_settings::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        }

        let config = Self::read_config(&txn).await?;
        txn.commit().await?;

        if !entries.is_empty() {
            log::info!("Points settings updated: {config:?}");
        }
        Ok(config)
    }

    async fn ensure_defaults<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
        let now = Utc::now();
        let rows = PointsConfig::default()
            .entries()
            .into_iter()
            .map(|(key, value)| app_settings::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value),
                updated_at: Set(Some(now)),
            });

        match app_settings::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::column(app_settings::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn read_config<C: ConnectionTrait>(conn: &C) -> Result<PointsConfig, DbErr> {
        let rows = app_settings::Entity::find().all(conn).await?;
        let mut config = PointsConfig::default();
        for row in rows {
            config.apply(&row.key, row.value);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{shared_test_pool, test_pool};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_get_config_creates_defaults_once() {
        let pool = test_pool().await;
        let service = SettingsService::new(pool.clone());

        let first = service.get_config().await.unwrap();
        assert_eq!(
            first,
            PointsConfig {
                points_per_register: 50,
                points_per_event_join: 10,
                points_per_share: 5,
            }
        );

        let second = service.get_config().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(app_settings::Entity::find().count(&pool).await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_reads_do_not_duplicate() {
        let (pool, _dir) = shared_test_pool(8).await;
        let service = SettingsService::new(pool.clone());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let svc = service.clone();
                tokio::spawn(async move { svc.get_config().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), PointsConfig::default());
        }
        assert_eq!(app_settings::Entity::find().count(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_config_is_partial() {
        let pool = test_pool().await;
        let service = SettingsService::new(pool);

        let updated = service
            .update_config(UpdatePointsConfigRequest {
                points_per_share: Some(7),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.points_per_share, 7);
        assert_eq!(updated.points_per_register, 50);
        assert_eq!(updated.points_per_event_join, 10);

        // 无变化的更新不报错
        let same = service
            .update_config(UpdatePointsConfigRequest {
                points_per_share: Some(7),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(same, updated);
        assert_eq!(service.get_config().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_config_rejects_negative_values() {
        let pool = test_pool().await;
        let service = SettingsService::new(pool);

        let err = service
            .update_config(UpdatePointsConfigRequest {
                points_per_register: Some(-1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
