use crate::entities::{PointsReason, point_transaction_entity as ledger, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminAdjustPointsRequest, PaginatedResponse, PaginationParams, PointTransactionResponse,
    PointsBalanceResponse, PointsHistoryPageResponse, PointsHistoryQuery,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 积分账本
///
/// 余额只通过 `points = points ± n` 形式的单条 UPDATE 修改，
/// 并发发放不会丢失更新；扣除带 `points >= n` 条件，余额不会为负。
/// 每次变动都会在同一事务内写入一条流水。
#[derive(Clone)]
pub struct PointsService {
    pool: DatabaseConnection,
}

impl PointsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 发放积分，返回发放后的余额
    pub async fn grant_points(
        &self,
        user_id: i64,
        amount: i64,
        reason: PointsReason,
        description: Option<String>,
    ) -> AppResult<i64> {
        let txn = self.pool.begin().await?;
        let balance = Self::grant_points_tx(&txn, user_id, amount, reason, description).await?;
        txn.commit().await?;
        Ok(balance)
    }

    /// 在调用方事务内发放积分
    pub async fn grant_points_tx<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        amount: i64,
        reason: PointsReason,
        description: Option<String>,
    ) -> AppResult<i64> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Granted points must not be negative".into(),
            ));
        }

        let res = users::Entity::update_many()
            .col_expr(users::Column::Points, Expr::col(users::Column::Points).add(amount))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }

        let balance = Self::balance_of(conn, user_id).await?;
        Self::record(conn, user_id, amount, balance, reason, description).await?;

        log::info!("Granted {amount} points to user {user_id} ({reason}), balance {balance}");
        Ok(balance)
    }

    /// 在调用方事务内扣除积分，余额不足时返回 InsufficientPoints 且不做任何修改
    pub async fn deduct_points_tx<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        amount: i64,
        reason: PointsReason,
        description: Option<String>,
    ) -> AppResult<i64> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Deducted points must be positive".into(),
            ));
        }

        let res = users::Entity::update_many()
            .col_expr(users::Column::Points, Expr::col(users::Column::Points).sub(amount))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Points.gte(amount))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            let exists = users::Entity::find_by_id(user_id).one(conn).await?.is_some();
            return Err(if exists {
                AppError::InsufficientPoints
            } else {
                AppError::NotFound("User not found".into())
            });
        }

        let balance = Self::balance_of(conn, user_id).await?;
        Self::record(conn, user_id, -amount, balance, reason, description).await?;

        log::info!("Deducted {amount} points from user {user_id} ({reason}), balance {balance}");
        Ok(balance)
    }

    /// 管理员调整：正数发放，负数扣除
    pub async fn adjust_points(
        &self,
        user_id: i64,
        request: AdminAdjustPointsRequest,
    ) -> AppResult<PointsBalanceResponse> {
        let txn = self.pool.begin().await?;
        let balance = match request.amount {
            0 => {
                return Err(AppError::ValidationError(
                    "Amount must not be zero".into(),
                ));
            }
            n if n > 0 => {
                Self::grant_points_tx(&txn, user_id, n, PointsReason::AdminGrant, request.description)
                    .await?
            }
            n => {
                // i64::MIN 无法取反
                let amount = n.checked_neg().ok_or_else(|| {
                    AppError::ValidationError("Amount is out of range".into())
                })?;
                Self::deduct_points_tx(
                    &txn,
                    user_id,
                    amount,
                    PointsReason::AdminGrant,
                    request.description,
                )
                .await?
            }
        };
        txn.commit().await?;

        Ok(PointsBalanceResponse {
            user_id,
            amount: request.amount,
            balance,
        })
    }

    /// 积分流水（分页，最新在前）
    pub async fn history(
        &self,
        user_id: i64,
        query: &PointsHistoryQuery,
    ) -> AppResult<PointsHistoryPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let base_query = ledger::Entity::find().filter(ledger::Column::UserId.eq(user_id));
        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by(ledger::Column::Id, Order::Desc)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(PointTransactionResponse::from)
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    pub async fn balance(&self, user_id: i64) -> AppResult<i64> {
        Self::balance_of(&self.pool, user_id).await
    }

    async fn balance_of<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<i64> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .map(|u| u.points)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn record<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        amount: i64,
        balance_after: i64,
        reason: PointsReason,
        description: Option<String>,
    ) -> AppResult<()> {
        ledger::ActiveModel {
            user_id: Set(user_id),
            amount: Set(amount),
            balance_after: Set(balance_after),
            reason: Set(reason),
            description: Set(description),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::insert_user;
    use crate::database::{shared_test_pool, test_pool};
    use crate::entities::UserLevel;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_grants_are_not_lost() {
        let (pool, _dir) = shared_test_pool(8).await;
        let user = insert_user(&pool, "a@example.com", 0, UserLevel::Beginner).await;
        let user_id = user.id;
        let service = PointsService::new(pool.clone());

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let svc = service.clone();
                tokio::spawn(async move {
                    svc.grant_points(user_id, 10, PointsReason::Share, None).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(service.balance(user.id).await.unwrap(), 1000);
        let ledger_rows = ledger::Entity::find()
            .filter(ledger::Column::UserId.eq(user.id))
            .count(&pool)
            .await
            .unwrap();
        assert_eq!(ledger_rows, 100);
    }

    #[tokio::test]
    async fn test_write_conflict_is_retryable() {
        let (pool, _dir) = shared_test_pool(2).await;
        let user = insert_user(&pool, "lock@example.com", 0, UserLevel::Beginner).await;

        // reader 先持有读快照，writer 拿到写锁后 reader 无法升级为写事务
        let reader = pool.begin().await.unwrap();
        users::Entity::find_by_id(user.id).one(&reader).await.unwrap();
        let writer = pool.begin().await.unwrap();
        PointsService::grant_points_tx(&writer, user.id, 5, PointsReason::Share, None)
            .await
            .unwrap();

        let err = PointsService::grant_points_tx(&reader, user.id, 5, PointsReason::Share, None)
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
        assert!(matches!(err, AppError::TransientStore(_)));

        reader.rollback().await.unwrap();
        writer.commit().await.unwrap();
        assert_eq!(PointsService::new(pool).balance(user.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_deduct_never_goes_negative() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "b@example.com", 30, UserLevel::Beginner).await;
        let service = PointsService::new(pool.clone());

        let balance =
            PointsService::deduct_points_tx(&pool, user.id, 20, PointsReason::LotteryEntry, None)
                .await
                .unwrap();
        assert_eq!(balance, 10);

        let err =
            PointsService::deduct_points_tx(&pool, user.id, 20, PointsReason::LotteryEntry, None)
                .await
                .unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints));
        assert_eq!(service.balance(user.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_grant_to_missing_user() {
        let pool = test_pool().await;
        let service = PointsService::new(pool);
        let err = service
            .grant_points(999, 5, PointsReason::Gift, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_adjust_and_history() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "c@example.com", 0, UserLevel::Beginner).await;
        let service = PointsService::new(pool);

        let granted = service
            .adjust_points(
                user.id,
                AdminAdjustPointsRequest {
                    amount: 40,
                    description: Some("welcome bonus".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(granted.balance, 40);

        let deducted = service
            .adjust_points(
                user.id,
                AdminAdjustPointsRequest {
                    amount: -15,
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(deducted.balance, 25);

        let zero = service
            .adjust_points(
                user.id,
                AdminAdjustPointsRequest {
                    amount: 0,
                    description: None,
                },
            )
            .await;
        assert!(matches!(zero, Err(AppError::ValidationError(_))));

        let overflow = service
            .adjust_points(
                user.id,
                AdminAdjustPointsRequest {
                    amount: i64::MIN,
                    description: None,
                },
            )
            .await;
        assert!(matches!(overflow, Err(AppError::ValidationError(_))));

        let page = service
            .history(
                user.id,
                &PointsHistoryQuery {
                    page: None,
                    per_page: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].amount, -15);
        assert_eq!(page.data[0].balance_after, 25);
        assert_eq!(page.data[1].description.as_deref(), Some("welcome bonus"));
    }
}
