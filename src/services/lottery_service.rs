use crate::entities::{
    EligibilityType, LotteryStatus, PointsReason, UserLevel, lottery_entity as lotteries,
    lottery_participant_entity as participants, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateLotteryRequest, DrawResponse, EligibilityResponse, EnterLotteryResponse,
    LotteryResponse, UpdateLotteryRequest,
};
use crate::services::PointsService;
use crate::services::eligibility::{check_eligibility, entry_cost};
use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

/// 从参与名单中等概率抽取一人，名单为空时返回 None
pub fn pick_winner<R: Rng + ?Sized>(participants: &[i64], rng: &mut R) -> Option<i64> {
    participants.choose(rng).copied()
}

#[derive(Clone)]
pub struct LotteryService {
    pool: DatabaseConnection,
}

impl LotteryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 抽奖列表（含参与名单，最新在前）
    pub async fn list_lotteries(&self) -> AppResult<Vec<LotteryResponse>> {
        let list = lotteries::Entity::find()
            .order_by_desc(lotteries::Column::Id)
            .all(&self.pool)
            .await?;
        if list.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = list.iter().map(|l| l.id).collect();
        let rows = participants::Entity::find()
            .filter(participants::Column::LotteryId.is_in(ids))
            .order_by_asc(participants::Column::Id)
            .all(&self.pool)
            .await?;

        let mut by_lottery: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            by_lottery.entry(row.lottery_id).or_default().push(row.user_id);
        }

        Ok(list
            .into_iter()
            .map(|l| {
                let roster = by_lottery.remove(&l.id).unwrap_or_default();
                LotteryResponse::new(l, roster)
            })
            .collect())
    }

    pub async fn get_lottery(&self, lottery_id: i64) -> AppResult<LotteryResponse> {
        let lottery = Self::find_lottery(&self.pool, lottery_id).await?;
        let roster = Self::participant_ids(&self.pool, lottery_id).await?;
        Ok(LotteryResponse::new(lottery, roster))
    }

    /// 创建抽奖（管理员）
    pub async fn create_lottery(&self, request: CreateLotteryRequest) -> AppResult<LotteryResponse> {
        validate_text("title", &request.title)?;
        validate_text("prize", &request.prize)?;
        validate_rule(
            request.eligibility_type,
            request.min_points_to_enter,
            request.min_level,
            request.specific_user_id,
        )?;

        let now = Utc::now();
        let model = lotteries::ActiveModel {
            title: Set(request.title.trim().to_string()),
            prize: Set(request.prize.trim().to_string()),
            draw_date: Set(request.draw_date),
            image: Set(request.image),
            is_active: Set(true),
            status: Set(LotteryStatus::Open),
            winner_id: Set(None),
            eligibility_type: Set(request.eligibility_type),
            min_points_to_enter: Set(request.min_points_to_enter),
            min_level: Set(request.min_level),
            specific_user_id: Set(request.specific_user_id),
            drawn_at: Set(None),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Lottery {} created ({})", model.id, model.eligibility_type);
        Ok(LotteryResponse::new(model, Vec::new()))
    }

    /// 修改抽奖（管理员），只允许在开奖前修改
    pub async fn update_lottery(
        &self,
        lottery_id: i64,
        request: UpdateLotteryRequest,
    ) -> AppResult<LotteryResponse> {
        let txn = self.pool.begin().await?;
        let lottery = Self::find_lottery(&txn, lottery_id).await?;
        if lottery.is_finalized() {
            return Err(AppError::AlreadyDrawn);
        }

        let eligibility_type = request.eligibility_type.unwrap_or(lottery.eligibility_type);
        let min_points = request
            .min_points_to_enter
            .unwrap_or(lottery.min_points_to_enter);
        let min_level = request.min_level.or(lottery.min_level);
        let specific_user_id = request.specific_user_id.or(lottery.specific_user_id);
        validate_rule(eligibility_type, min_points, min_level, specific_user_id)?;

        let mut am = lottery.into_active_model();
        if let Some(title) = request.title {
            validate_text("title", &title)?;
            am.title = Set(title.trim().to_string());
        }
        if let Some(prize) = request.prize {
            validate_text("prize", &prize)?;
            am.prize = Set(prize.trim().to_string());
        }
        if let Some(draw_date) = request.draw_date {
            am.draw_date = Set(Some(draw_date));
        }
        if let Some(image) = request.image {
            am.image = Set(Some(image));
        }
        am.eligibility_type = Set(eligibility_type);
        am.min_points_to_enter = Set(min_points);
        am.min_level = Set(min_level);
        am.specific_user_id = Set(specific_user_id);
        am.updated_at = Set(Some(Utc::now()));

        let updated = am.update(&txn).await?;
        let roster = Self::participant_ids(&txn, lottery_id).await?;
        txn.commit().await?;

        Ok(LotteryResponse::new(updated, roster))
    }

    /// 删除抽奖（管理员），参与名单一并删除
    pub async fn delete_lottery(&self, lottery_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        participants::Entity::delete_many()
            .filter(participants::Column::LotteryId.eq(lottery_id))
            .exec(&txn)
            .await?;
        let res = lotteries::Entity::delete_by_id(lottery_id).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Lottery not found".into()));
        }
        txn.commit().await?;

        log::info!("Lottery {lottery_id} deleted");
        Ok(())
    }

    /// 报名资格预检（不修改任何数据）
    pub async fn check(&self, user_id: i64, lottery_id: i64) -> AppResult<EligibilityResponse> {
        let lottery = Self::find_lottery(&self.pool, lottery_id).await?;
        let user = Self::find_user(&self.pool, user_id).await?;
        let roster = Self::participant_ids(&self.pool, lottery_id).await?;

        Ok(EligibilityResponse::new(
            lottery_id,
            check_eligibility(&user, &lottery, &roster),
        ))
    }

    /// 报名
    ///
    /// 资格判定与报名写入在同一事务内完成：
    /// - 先对 lotteries 做 `is_active = true` 条件更新，锁住该行，开奖无法与报名交错
    /// - points 类型按门槛扣除积分，余额不足则整体回滚
    /// - (lottery_id, user_id) 唯一，重复报名返回 AlreadyEntered
    pub async fn enter(&self, user_id: i64, lottery_id: i64) -> AppResult<EnterLotteryResponse> {
        let txn = self.pool.begin().await?;

        // 先对开放中的抽奖做一次条件写入，拿到写锁后再读名单，开奖与报名互斥
        let locked = lotteries::Entity::update_many()
            .col_expr(lotteries::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(lotteries::Column::Id.eq(lottery_id))
            .filter(lotteries::Column::IsActive.eq(true))
            .filter(lotteries::Column::Status.eq(LotteryStatus::Open))
            .exec(&txn)
            .await?;

        let lottery = Self::find_lottery(&txn, lottery_id).await?;
        if locked.rows_affected == 0 {
            return Err(AppError::LotteryClosed);
        }

        let user = Self::find_user(&txn, user_id).await?;
        let roster = Self::participant_ids(&txn, lottery_id).await?;
        check_eligibility(&user, &lottery, &roster)?;

        let cost = entry_cost(&lottery);
        let balance = if cost > 0 {
            PointsService::deduct_points_tx(
                &txn,
                user_id,
                cost,
                PointsReason::LotteryEntry,
                Some(format!("Lottery entry: {}", lottery.title)),
            )
            .await?
        } else {
            user.points
        };

        let inserted = participants::Entity::insert(participants::ActiveModel {
            lottery_id: Set(lottery_id),
            user_id: Set(user_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                participants::Column::LotteryId,
                participants::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::AlreadyEntered);
        }

        txn.commit().await?;

        log::info!("User {user_id} entered lottery {lottery_id} (cost {cost})");
        Ok(EnterLotteryResponse {
            lottery_id,
            points_spent: cost,
            balance,
            participants_count: roster.len() as i64 + 1,
        })
    }

    /// 开奖（管理员）
    ///
    /// 事务的第一条语句以 `is_active = true` 为条件关闭抽奖，只有一个请求能成功；
    /// 之后读取的名单即最终名单。名单为空则作废 (voided)。
    pub async fn draw(&self, lottery_id: i64) -> AppResult<DrawResponse> {
        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let closed = lotteries::Entity::update_many()
            .col_expr(lotteries::Column::IsActive, Expr::value(false))
            .col_expr(lotteries::Column::UpdatedAt, Expr::value(now))
            .filter(lotteries::Column::Id.eq(lottery_id))
            .filter(lotteries::Column::IsActive.eq(true))
            .filter(lotteries::Column::Status.eq(LotteryStatus::Open))
            .exec(&txn)
            .await?;

        let lottery = Self::find_lottery(&txn, lottery_id).await?;
        if closed.rows_affected == 0 {
            return Err(AppError::AlreadyDrawn);
        }

        let roster = Self::participant_ids(&txn, lottery_id).await?;
        let winner_id = {
            let mut rng = rand::thread_rng();
            pick_winner(&roster, &mut rng)
        };
        let outcome = match winner_id {
            Some(_) => LotteryStatus::Drawn,
            None => LotteryStatus::Voided,
        };

        let mut am = lottery.into_active_model();
        am.is_active = Set(false);
        am.status = Set(outcome);
        am.winner_id = Set(winner_id);
        am.drawn_at = Set(Some(now));
        am.updated_at = Set(Some(now));
        let updated = am.update(&txn).await?;

        txn.commit().await?;

        match winner_id {
            Some(winner) => log::info!(
                "Lottery {lottery_id} drawn: winner {winner} of {} participants",
                roster.len()
            ),
            None => log::info!("Lottery {lottery_id} voided: no participants"),
        }

        Ok(DrawResponse {
            winner_id,
            outcome,
            lottery: LotteryResponse::new(updated, roster),
        })
    }

    async fn find_lottery<C: ConnectionTrait>(
        conn: &C,
        lottery_id: i64,
    ) -> AppResult<lotteries::Model> {
        lotteries::Entity::find_by_id(lottery_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Lottery not found".into()))
    }

    async fn find_user<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// 按报名先后排序的参与者
    async fn participant_ids<C: ConnectionTrait>(conn: &C, lottery_id: i64) -> AppResult<Vec<i64>> {
        let rows = participants::Entity::find()
            .filter(participants::Column::LotteryId.eq(lottery_id))
            .order_by_asc(participants::Column::Id)
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }
}

fn validate_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn validate_rule(
    eligibility_type: EligibilityType,
    min_points: i64,
    min_level: Option<UserLevel>,
    specific_user_id: Option<i64>,
) -> AppResult<()> {
    if min_points < 0 {
        return Err(AppError::ValidationError(
            "min_points_to_enter must not be negative".into(),
        ));
    }
    match eligibility_type {
        EligibilityType::Level if min_level.is_none() => Err(AppError::ValidationError(
            "min_level is required for level lotteries".into(),
        )),
        EligibilityType::SpecificUser if specific_user_id.is_none() => Err(
            AppError::ValidationError("specific_user_id is required for specific_user lotteries".into()),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::insert_user;
    use crate::database::{shared_test_pool, test_pool};
    use crate::models::IneligibleKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn create_request(eligibility_type: EligibilityType) -> CreateLotteryRequest {
        CreateLotteryRequest {
            title: "Weekend retreat".into(),
            prize: "Two nights in the Galilee".into(),
            draw_date: None,
            image: None,
            eligibility_type,
            min_points_to_enter: 0,
            min_level: None,
            specific_user_id: None,
        }
    }

    #[test]
    fn test_pick_winner_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_winner(&[], &mut rng), None);
    }

    #[test]
    fn test_pick_winner_is_uniform() {
        let roster = [11, 22, 33, 44, 55];
        let mut rng = StdRng::seed_from_u64(20261016);
        let mut counts: HashMap<i64, u32> = HashMap::new();
        let draws = 10_000;
        for _ in 0..draws {
            let winner = pick_winner(&roster, &mut rng).unwrap();
            *counts.entry(winner).or_default() += 1;
        }

        let expected = draws as f64 / roster.len() as f64;
        let chi_square: f64 = roster
            .iter()
            .map(|id| {
                let observed = *counts.get(id).unwrap_or(&0) as f64;
                (observed - expected).powi(2) / expected
            })
            .sum();
        // df = 4, p = 0.001
        assert!(chi_square < 18.47, "chi_square = {chi_square}");
    }

    #[tokio::test]
    async fn test_level_gated_entry() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool.clone());
        let mut req = create_request(EligibilityType::Level);
        req.min_level = Some(UserLevel::Leader);
        let lottery = svc.create_lottery(req).await.unwrap();

        let active = insert_user(&pool, "active@example.com", 0, UserLevel::Active).await;
        let creator = insert_user(&pool, "creator@example.com", 0, UserLevel::Creator).await;

        let check = svc.check(active.id, lottery.id).await.unwrap();
        assert!(!check.eligible);
        assert_eq!(check.reason.as_deref(), Some("INELIGIBLE_LEVEL"));

        let err = svc.enter(active.id, lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::Ineligible(IneligibleKind::Level)));

        let entered = svc.enter(creator.id, lottery.id).await.unwrap();
        assert_eq!(entered.participants_count, 1);
        assert_eq!(entered.points_spent, 0);

        let err = svc.enter(creator.id, lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyEntered));
    }

    #[tokio::test]
    async fn test_points_gated_entry_deducts() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool.clone());
        let mut req = create_request(EligibilityType::Points);
        req.min_points_to_enter = 30;
        let lottery = svc.create_lottery(req).await.unwrap();

        let rich = insert_user(&pool, "rich@example.com", 50, UserLevel::Beginner).await;
        let poor = insert_user(&pool, "poor@example.com", 29, UserLevel::Beginner).await;

        let entered = svc.enter(rich.id, lottery.id).await.unwrap();
        assert_eq!(entered.points_spent, 30);
        assert_eq!(entered.balance, 20);

        let err = svc.enter(poor.id, lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::Ineligible(IneligibleKind::Points)));

        let roster = svc.get_lottery(lottery.id).await.unwrap().participants;
        assert_eq!(roster, vec![rich.id]);
    }

    #[tokio::test]
    async fn test_draw_is_final() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool.clone());
        let lottery = svc
            .create_lottery(create_request(EligibilityType::All))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for i in 0..3 {
            let user = insert_user(&pool, &format!("p{i}@example.com"), 0, UserLevel::Beginner).await;
            svc.enter(user.id, lottery.id).await.unwrap();
            ids.push(user.id);
        }

        let drawn = svc.draw(lottery.id).await.unwrap();
        assert_eq!(drawn.outcome, LotteryStatus::Drawn);
        let winner = drawn.winner_id.unwrap();
        assert!(ids.contains(&winner));
        assert!(!drawn.lottery.is_active);

        let err = svc.draw(lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDrawn));

        let late = insert_user(&pool, "late@example.com", 0, UserLevel::Beginner).await;
        let err = svc.enter(late.id, lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::LotteryClosed));

        let err = svc
            .update_lottery(
                lottery.id,
                UpdateLotteryRequest {
                    title: Some("renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyDrawn));

        let reloaded = svc.get_lottery(lottery.id).await.unwrap();
        assert_eq!(reloaded.winner_id, Some(winner));
        assert_eq!(reloaded.participants, ids);
    }

    #[tokio::test]
    async fn test_draw_without_participants_voids() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool);
        let lottery = svc
            .create_lottery(create_request(EligibilityType::All))
            .await
            .unwrap();

        let result = svc.draw(lottery.id).await.unwrap();
        assert_eq!(result.outcome, LotteryStatus::Voided);
        assert_eq!(result.winner_id, None);

        let err = svc.draw(lottery.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDrawn));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_draws_pick_one_winner() {
        let (pool, _dir) = shared_test_pool(8).await;
        let svc = LotteryService::new(pool.clone());
        let lottery = svc
            .create_lottery(create_request(EligibilityType::All))
            .await
            .unwrap();
        for i in 0..5 {
            let user = insert_user(&pool, &format!("c{i}@example.com"), 0, UserLevel::Beginner).await;
            svc.enter(user.id, lottery.id).await.unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                let id = lottery.id;
                tokio::spawn(async move { svc.draw(id).await })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(result) => winners.push(result.winner_id),
                Err(AppError::AlreadyDrawn) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(svc.get_lottery(lottery.id).await.unwrap().winner_id, winners[0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_entries_racing_a_draw_stay_consistent() {
        let (pool, _dir) = shared_test_pool(8).await;
        let svc = LotteryService::new(pool.clone());
        let lottery = svc
            .create_lottery(create_request(EligibilityType::All))
            .await
            .unwrap();
        let first = insert_user(&pool, "early@example.com", 0, UserLevel::Beginner).await;
        svc.enter(first.id, lottery.id).await.unwrap();

        let mut user_ids = Vec::new();
        for i in 0..10 {
            let user = insert_user(&pool, &format!("race{i}@example.com"), 0, UserLevel::Beginner).await;
            user_ids.push(user.id);
        }

        let entries: Vec<_> = user_ids
            .iter()
            .map(|&user_id| {
                let svc = svc.clone();
                let id = lottery.id;
                tokio::spawn(async move { svc.enter(user_id, id).await })
            })
            .collect();
        let draw = {
            let svc = svc.clone();
            let id = lottery.id;
            tokio::spawn(async move { svc.draw(id).await })
        };

        let mut entered = 0;
        for handle in entries {
            match handle.await.unwrap() {
                Ok(_) => entered += 1,
                Err(AppError::LotteryClosed) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        let drawn = draw.await.unwrap().unwrap();

        // 开奖时的名单就是最终名单，之后没有人能再加入
        let reloaded = svc.get_lottery(lottery.id).await.unwrap();
        assert_eq!(reloaded.participants, drawn.lottery.participants);
        assert_eq!(reloaded.participants.len(), entered + 1);
        let winner = drawn.winner_id.unwrap();
        assert!(reloaded.participants.contains(&winner));
        assert_eq!(reloaded.winner_id, Some(winner));
    }

    #[tokio::test]
    async fn test_rule_validation_and_delete() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool);

        let err = svc
            .create_lottery(create_request(EligibilityType::SpecificUser))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let lottery = svc
            .create_lottery(create_request(EligibilityType::All))
            .await
            .unwrap();
        svc.delete_lottery(lottery.id).await.unwrap();
        assert!(matches!(
            svc.get_lottery(lottery.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_lottery(lottery.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
