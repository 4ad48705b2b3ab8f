use crate::entities::{
    PointsReason, gift_code_entity as gift_codes, gift_code_redemption_entity as redemptions,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGiftCodeRequest, CreateGiftCodeResponse, GiftCodeResponse, RedeemGiftCodeResponse,
};
use crate::services::PointsService;
use crate::utils::generate_gift_code;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// 自动生成时遇到重复码的最大重试次数
const MAX_GENERATE_ATTEMPTS: usize = 5;
const MAX_CODE_LENGTH: usize = 64;

#[derive(Clone)]
pub struct GiftCodeService {
    pool: DatabaseConnection,
    frontend_base_url: String,
}

impl GiftCodeService {
    pub fn new(pool: DatabaseConnection, frontend_base_url: String) -> Self {
        Self {
            pool,
            frontend_base_url,
        }
    }

    /// 创建礼品码（管理员）
    ///
    /// 指定 code 时重复返回 DuplicateCode；未指定时自动生成，碰撞则重试。
    pub async fn create_code(
        &self,
        admin_id: i64,
        request: CreateGiftCodeRequest,
    ) -> AppResult<CreateGiftCodeResponse> {
        if request.points < 0 {
            return Err(AppError::ValidationError(
                "points must not be negative".into(),
            ));
        }
        if request.max_uses < 1 {
            return Err(AppError::ValidationError(
                "max_uses must be at least 1".into(),
            ));
        }
        if let Some(expires_at) = request.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::ValidationError(
                "expires_at must be in the future".into(),
            ));
        }

        let model = match request.code.as_deref().map(str::trim) {
            Some(code) => {
                validate_code(code)?;
                self.try_insert(code, admin_id, &request)
                    .await?
                    .ok_or_else(|| AppError::DuplicateCode(code.to_string()))?
            }
            None => {
                let mut created = None;
                for attempt in 1..=MAX_GENERATE_ATTEMPTS {
                    let code = generate_gift_code();
                    match self.try_insert(&code, admin_id, &request).await? {
                        Some(model) => {
                            created = Some(model);
                            break;
                        }
                        None => log::warn!("Generated gift code collided (attempt {attempt})"),
                    }
                }
                created.ok_or_else(|| {
                    AppError::InternalError("Could not generate a unique gift code".into())
                })?
            }
        };

        log::info!(
            "Gift code {} created by admin {admin_id}: {} points x {} uses",
            model.code,
            model.points,
            model.max_uses
        );

        let redeem_link = self.redeem_link(&model.code);
        Ok(CreateGiftCodeResponse {
            gift_code: model.into(),
            redeem_link,
        })
    }

    /// 全部礼品码（最新在前）
    pub async fn list_codes(&self) -> AppResult<Vec<GiftCodeResponse>> {
        let list = gift_codes::Entity::find()
            .order_by_desc(gift_codes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 兑换礼品码
    ///
    /// 1. 查码（区分大小写），过期则拒绝
    /// 2. 同一用户只能兑换一次
    /// 3. 条件更新 used_count < max_uses，失败即已用完
    /// 4. 写兑换记录并发放积分，全部在同一事务内
    pub async fn redeem(&self, user_id: i64, code: &str) -> AppResult<RedeemGiftCodeResponse> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::ValidationError("code is required".into()));
        }

        let txn = self.pool.begin().await?;
        let now = Utc::now();

        // 事务的第一条语句就是条件写入：存在、未过期、未用完才会 +1
        let claimed = gift_codes::Entity::update_many()
            .col_expr(
                gift_codes::Column::UsedCount,
                Expr::col(gift_codes::Column::UsedCount).add(1),
            )
            .filter(gift_codes::Column::Code.eq(code))
            .filter(
                Condition::any()
                    .add(gift_codes::Column::ExpiresAt.is_null())
                    .add(gift_codes::Column::ExpiresAt.gt(now)),
            )
            .filter(
                Expr::col(gift_codes::Column::UsedCount)
                    .lt(Expr::col(gift_codes::Column::MaxUses)),
            )
            .exec(&txn)
            .await?;

        let gift = gift_codes::Entity::find()
            .filter(gift_codes::Column::Code.eq(code))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift code not found".into()))?;

        if claimed.rows_affected == 0 {
            return Err(Self::rejection(&txn, &gift, user_id, now).await?);
        }

        if !Self::insert_redemption(&txn, gift.id, user_id).await? {
            // 已兑换过；事务回滚，刚才的 +1 一并撤销
            return Err(AppError::AlreadyRedeemed);
        }

        let balance = PointsService::grant_points_tx(
            &txn,
            user_id,
            gift.points,
            PointsReason::Gift,
            Some(format!("Gift code {}", gift.code)),
        )
        .await?;

        txn.commit().await?;

        log::info!("User {user_id} redeemed gift code {}", gift.code);
        Ok(RedeemGiftCodeResponse {
            code: gift.code,
            points_awarded: gift.points,
            balance,
        })
    }

    pub fn redeem_link(&self, code: &str) -> String {
        format!(
            "{}/gifts/redeem?code={code}",
            self.frontend_base_url.trim_end_matches('/')
        )
    }

    /// 插入礼品码，code 已存在时返回 None
    async fn try_insert(
        &self,
        code: &str,
        admin_id: i64,
        request: &CreateGiftCodeRequest,
    ) -> AppResult<Option<gift_codes::Model>> {
        let inserted = gift_codes::Entity::insert(gift_codes::ActiveModel {
            code: Set(code.to_string()),
            points: Set(request.points),
            max_uses: Set(request.max_uses),
            used_count: Set(0),
            expires_at: Set(request.expires_at),
            created_by: Set(Some(admin_id)),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(gift_codes::Column::Code)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.pool)
        .await?;

        if inserted == 0 {
            return Ok(None);
        }

        let model = gift_codes::Entity::find()
            .filter(gift_codes::Column::Code.eq(code))
            .one(&self.pool)
            .await?;
        Ok(model)
    }

    /// 条件更新未命中时的具体原因：过期 > 已兑换 > 已用完
    async fn rejection<C: ConnectionTrait>(
        conn: &C,
        gift: &gift_codes::Model,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AppError> {
        if gift.is_expired(now) {
            return Ok(AppError::GiftCodeExpired);
        }
        let already = redemptions::Entity::find()
            .filter(redemptions::Column::GiftCodeId.eq(gift.id))
            .filter(redemptions::Column::UserId.eq(user_id))
            .one(conn)
            .await?;
        Ok(if already.is_some() {
            AppError::AlreadyRedeemed
        } else {
            AppError::Exhausted
        })
    }

    async fn insert_redemption<C: ConnectionTrait>(
        conn: &C,
        gift_code_id: i64,
        user_id: i64,
    ) -> AppResult<bool> {
        let inserted = redemptions::Entity::insert(redemptions::ActiveModel {
            gift_code_id: Set(gift_code_id),
            user_id: Set(user_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([redemptions::Column::GiftCodeId, redemptions::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        Ok(inserted > 0)
    }
}

/// 指定的礼品码只允许字母、数字、`-`、`_`，可直接放进兑换链接
fn validate_code(code: &str) -> AppResult<()> {
    if code.is_empty() || code.len() > MAX_CODE_LENGTH {
        return Err(AppError::ValidationError(format!(
            "code must be 1-{MAX_CODE_LENGTH} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::ValidationError(
            "code may only contain letters, digits, '-' and '_'".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::insert_user;
    use crate::database::{shared_test_pool, test_pool};
    use crate::entities::{UserLevel, user_entity as users};
    use chrono::Duration;

    fn request(code: Option<&str>, points: i64, max_uses: i32) -> CreateGiftCodeRequest {
        CreateGiftCodeRequest {
            code: code.map(str::to_string),
            points,
            max_uses,
            expires_at: None,
        }
    }

    fn service(pool: &DatabaseConnection) -> GiftCodeService {
        GiftCodeService::new(pool.clone(), "https://nashi.example/".into())
    }

    #[tokio::test]
    async fn test_create_generates_code_and_link() {
        let pool = test_pool().await;
        let created = service(&pool)
            .create_code(1, request(None, 20, 3))
            .await
            .unwrap();

        assert_eq!(created.gift_code.code.len(), 8);
        assert_eq!(created.gift_code.remaining_uses, 3);
        assert_eq!(
            created.redeem_link,
            format!("https://nashi.example/gifts/redeem?code={}", created.gift_code.code)
        );
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let pool = test_pool().await;
        let svc = service(&pool);
        svc.create_code(1, request(Some("PURIM"), 10, 1)).await.unwrap();

        let err = svc
            .create_code(1, request(Some("PURIM"), 10, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCode(code) if code == "PURIM"));

        // 区分大小写
        assert!(svc.create_code(1, request(Some("purim"), 10, 1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = test_pool().await;
        let svc = service(&pool);
        assert!(matches!(
            svc.create_code(1, request(None, 10, 0)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_code(1, request(Some("has space"), 10, 1)).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_redeem_once_per_user() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "r@example.com", 0, UserLevel::Beginner).await;
        let svc = service(&pool);
        svc.create_code(1, request(Some("HANUKKAH"), 25, 10)).await.unwrap();

        let redeemed = svc.redeem(user.id, "HANUKKAH").await.unwrap();
        assert_eq!(redeemed.points_awarded, 25);
        assert_eq!(redeemed.balance, 25);

        let err = svc.redeem(user.id, "HANUKKAH").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyRedeemed));

        // 重复兑换不占用次数
        let gift = gift_codes::Entity::find()
            .filter(gift_codes::Column::Code.eq("HANUKKAH"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gift.used_count, 1);

        let err = svc.redeem(user.id, "NOPE").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "e@example.com", 0, UserLevel::Beginner).await;
        let svc = service(&pool);
        let created = svc.create_code(1, request(Some("OLD"), 5, 5)).await.unwrap();

        gift_codes::Entity::update_many()
            .col_expr(
                gift_codes::Column::ExpiresAt,
                Expr::value(Utc::now() - Duration::days(1)),
            )
            .filter(gift_codes::Column::Id.eq(created.gift_code.id))
            .exec(&pool)
            .await
            .unwrap();

        let err = svc.redeem(user.id, "OLD").await.unwrap_err();
        assert!(matches!(err, AppError::GiftCodeExpired));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeem_respects_max_uses() {
        let (pool, _dir) = shared_test_pool(8).await;
        let svc = service(&pool);
        svc.create_code(1, request(Some("FIVE"), 10, 5)).await.unwrap();

        let mut user_ids = Vec::new();
        for i in 0..20 {
            let user = insert_user(&pool, &format!("u{i}@example.com"), 0, UserLevel::Beginner).await;
            user_ids.push(user.id);
        }

        let handles: Vec<_> = user_ids
            .iter()
            .map(|&user_id| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.redeem(user_id, "FIVE").await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::Exhausted) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(succeeded, 5);

        let gift = gift_codes::Entity::find()
            .filter(gift_codes::Column::Code.eq("FIVE"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gift.used_count, 5);

        let rewarded = users::Entity::find()
            .filter(users::Column::Points.eq(10))
            .all(&pool)
            .await
            .unwrap();
        assert_eq!(rewarded.len(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeem_by_one_user_credits_once() {
        let (pool, _dir) = shared_test_pool(8).await;
        let svc = service(&pool);
        svc.create_code(1, request(Some("SHAVUOT"), 15, 100)).await.unwrap();
        let user = insert_user(&pool, "same@example.com", 0, UserLevel::Beginner).await;
        let user_id = user.id;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.redeem(user_id, "SHAVUOT").await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AppError::AlreadyRedeemed) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(succeeded, 1);

        let gift = gift_codes::Entity::find()
            .filter(gift_codes::Column::Code.eq("SHAVUOT"))
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(gift.used_count, 1);

        let reloaded = users::Entity::find_by_id(user_id).one(&pool).await.unwrap().unwrap();
        assert_eq!(reloaded.points, 15);
    }
}
