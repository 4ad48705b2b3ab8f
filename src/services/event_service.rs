use crate::entities::{
    PointsReason, event_attendee_entity as attendees, event_entity as events,
    event_rating_entity as ratings, event_share_entity as shares, user_entity as users,
    user_liked_event_entity as likes,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateEventRequest, EventPointsResponse, EventRatingResponse, EventResponse,
    LikeEventResponse, RateEventRequest, UpdateEventRequest,
};
use crate::services::{PointsService, SettingsService};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

#[derive(Debug, FromQueryResult)]
struct AttendeeCount {
    event_id: i64,
    total: i64,
}

#[derive(Debug, Clone, Copy, FromQueryResult)]
struct RatingStats {
    event_id: i64,
    total: i64,
    rating_sum: i64,
}

impl RatingStats {
    fn average(&self) -> Option<f64> {
        (self.total > 0).then(|| self.rating_sum as f64 / self.total as f64)
    }
}

#[derive(Clone)]
pub struct EventService {
    pool: DatabaseConnection,
    settings_service: SettingsService,
}

impl EventService {
    pub fn new(pool: DatabaseConnection, settings_service: SettingsService) -> Self {
        Self {
            pool,
            settings_service,
        }
    }

    /// 活动列表（按日期升序）
    pub async fn list_events(&self) -> AppResult<Vec<EventResponse>> {
        let list = events::Entity::find()
            .order_by_asc(events::Column::Date)
            .all(&self.pool)
            .await?;

        let counts = Self::attendee_counts(&self.pool, None).await?;
        let stats = Self::rating_stats(&self.pool, None).await?;

        Ok(list
            .into_iter()
            .map(|e| Self::to_response(e, &counts, &stats))
            .collect())
    }

    pub async fn get_event(&self, event_id: i64) -> AppResult<EventResponse> {
        let event = Self::find_event(&self.pool, event_id).await?;
        self.with_stats(event).await
    }

    pub async fn create_event(&self, request: CreateEventRequest) -> AppResult<EventResponse> {
        if request.title.trim().is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }
        if request.price < 0 {
            return Err(AppError::ValidationError("price must not be negative".into()));
        }

        let now = Utc::now();
        let model = events::ActiveModel {
            title: Set(request.title.trim().to_string()),
            date: Set(request.date),
            location: Set(request.location),
            category: Set(request.category),
            price: Set(request.price),
            image: Set(request.image),
            is_hero: Set(request.is_hero),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Event {} created", model.id);
        Ok(model.into())
    }

    pub async fn update_event(
        &self,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> AppResult<EventResponse> {
        let event = Self::find_event(&self.pool, event_id).await?;
        let mut am = event.into_active_model();

        if let Some(title) = request.title {
            if title.trim().is_empty() {
                return Err(AppError::ValidationError("title is required".into()));
            }
            am.title = Set(title.trim().to_string());
        }
        if let Some(price) = request.price {
            if price < 0 {
                return Err(AppError::ValidationError("price must not be negative".into()));
            }
            am.price = Set(price);
        }
        if let Some(date) = request.date {
            am.date = Set(date);
        }
        if let Some(location) = request.location {
            am.location = Set(Some(location));
        }
        if let Some(category) = request.category {
            am.category = Set(Some(category));
        }
        if let Some(image) = request.image {
            am.image = Set(Some(image));
        }
        if let Some(is_hero) = request.is_hero {
            am.is_hero = Set(is_hero);
        }
        am.updated_at = Set(Some(Utc::now()));

        let updated = am.update(&self.pool).await?;
        self.with_stats(updated).await
    }

    /// 删除活动及其报名、分享、收藏、评分记录
    pub async fn delete_event(&self, event_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        attendees::Entity::delete_many()
            .filter(attendees::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;
        shares::Entity::delete_many()
            .filter(shares::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;
        likes::Entity::delete_many()
            .filter(likes::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;
        ratings::Entity::delete_many()
            .filter(ratings::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;
        let res = events::Entity::delete_by_id(event_id).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        txn.commit().await?;

        log::info!("Event {event_id} deleted");
        Ok(())
    }

    /// 报名活动，首次报名按配置发放积分
    pub async fn join_event(&self, user_id: i64, event_id: i64) -> AppResult<EventPointsResponse> {
        let config = self.settings_service.get_config().await?;

        let txn = self.pool.begin().await?;
        let event = Self::find_event(&txn, event_id).await?;

        let inserted = attendees::Entity::insert(attendees::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([attendees::Column::EventId, attendees::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::AlreadyJoined);
        }

        let balance = PointsService::grant_points_tx(
            &txn,
            user_id,
            config.points_per_event_join,
            PointsReason::EventJoin,
            Some(event.title),
        )
        .await?;
        txn.commit().await?;

        Ok(EventPointsResponse {
            event_id,
            points_awarded: config.points_per_event_join,
            balance,
        })
    }

    /// 分享活动；每个用户每个活动只奖励一次，重复分享返回 0 积分
    pub async fn share_event(&self, user_id: i64, event_id: i64) -> AppResult<EventPointsResponse> {
        let config = self.settings_service.get_config().await?;

        let txn = self.pool.begin().await?;
        let event = Self::find_event(&txn, event_id).await?;

        let inserted = shares::Entity::insert(shares::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([shares::Column::EventId, shares::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let (points_awarded, balance) = if inserted == 0 {
            let balance = users::Entity::find_by_id(user_id)
                .one(&txn)
                .await?
                .map(|u| u.points)
                .ok_or_else(|| AppError::NotFound("User not found".into()))?;
            (0, balance)
        } else {
            let balance = PointsService::grant_points_tx(
                &txn,
                user_id,
                config.points_per_share,
                PointsReason::Share,
                Some(event.title),
            )
            .await?;
            (config.points_per_share, balance)
        };
        txn.commit().await?;

        Ok(EventPointsResponse {
            event_id,
            points_awarded,
            balance,
        })
    }

    /// 收藏 / 取消收藏，返回当前收藏列表
    pub async fn toggle_like(&self, user_id: i64, event_id: i64) -> AppResult<LikeEventResponse> {
        let txn = self.pool.begin().await?;
        Self::find_event(&txn, event_id).await?;

        let removed = likes::Entity::delete_many()
            .filter(likes::Column::UserId.eq(user_id))
            .filter(likes::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;

        let liked = if removed.rows_affected > 0 {
            false
        } else {
            likes::Entity::insert(likes::ActiveModel {
                user_id: Set(user_id),
                event_id: Set(event_id),
                created_at: Set(Some(Utc::now())),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::columns([likes::Column::UserId, likes::Column::EventId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
            true
        };

        let liked_event_ids = liked_event_ids(&txn, user_id).await?;
        txn.commit().await?;

        Ok(LikeEventResponse {
            event_id,
            liked,
            liked_event_ids,
        })
    }

    /// 评分 1-5，同一用户再次评分覆盖旧值
    pub async fn rate_event(
        &self,
        user_id: i64,
        event_id: i64,
        request: RateEventRequest,
    ) -> AppResult<EventRatingResponse> {
        if !RATING_RANGE.contains(&request.rating) {
            return Err(AppError::ValidationError(format!(
                "rating must be between {} and {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }

        let txn = self.pool.begin().await?;
        Self::find_event(&txn, event_id).await?;

        let now = Utc::now();
        ratings::Entity::insert(ratings::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            rating: Set(request.rating),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([ratings::Column::EventId, ratings::Column::UserId])
                .update_columns([ratings::Column::Rating, ratings::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let stats = Self::rating_stats(&txn, Some(event_id)).await?;
        txn.commit().await?;

        let stats = stats.get(&event_id);
        Ok(EventRatingResponse {
            event_id,
            rating: request.rating,
            average_rating: stats.and_then(RatingStats::average),
            ratings_count: stats.map_or(0, |s| s.total),
        })
    }

    async fn with_stats(&self, event: events::Model) -> AppResult<EventResponse> {
        let counts = Self::attendee_counts(&self.pool, Some(event.id)).await?;
        let stats = Self::rating_stats(&self.pool, Some(event.id)).await?;
        Ok(Self::to_response(event, &counts, &stats))
    }

    fn to_response(
        event: events::Model,
        counts: &HashMap<i64, i64>,
        stats: &HashMap<i64, RatingStats>,
    ) -> EventResponse {
        let attendees_count = counts.get(&event.id).copied().unwrap_or(0);
        let rating = stats.get(&event.id);
        EventResponse {
            attendees_count,
            average_rating: rating.and_then(RatingStats::average),
            ratings_count: rating.map_or(0, |s| s.total),
            ..EventResponse::from(event)
        }
    }

    /// 各活动报名人数；event_id 为 None 时统计全部活动
    async fn attendee_counts<C: ConnectionTrait>(
        conn: &C,
        event_id: Option<i64>,
    ) -> AppResult<HashMap<i64, i64>> {
        let mut query = attendees::Entity::find()
            .select_only()
            .column(attendees::Column::EventId)
            .column_as(Expr::col(attendees::Column::Id).count(), "total")
            .group_by(attendees::Column::EventId);
        if let Some(id) = event_id {
            query = query.filter(attendees::Column::EventId.eq(id));
        }

        Ok(query
            .into_model::<AttendeeCount>()
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.event_id, row.total))
            .collect())
    }

    async fn rating_stats<C: ConnectionTrait>(
        conn: &C,
        event_id: Option<i64>,
    ) -> AppResult<HashMap<i64, RatingStats>> {
        let mut query = ratings::Entity::find()
            .select_only()
            .column(ratings::Column::EventId)
            .column_as(Expr::col(ratings::Column::Id).count(), "total")
            .column_as(Expr::col(ratings::Column::Rating).sum(), "rating_sum")
            .group_by(ratings::Column::EventId);
        if let Some(id) = event_id {
            query = query.filter(ratings::Column::EventId.eq(id));
        }

        Ok(query
            .into_model::<RatingStats>()
            .all(conn)
            .await?
            .into_iter()
            .map(|row| (row.event_id, row))
            .collect())
    }

    async fn find_event<C: ConnectionTrait>(conn: &C, event_id: i64) -> AppResult<events::Model> {
        events::Entity::find_by_id(event_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }
}

/// 用户收藏的活动ID（按收藏先后）
pub(crate) async fn liked_event_ids<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<Vec<i64>> {
    let rows = likes::Entity::find()
        .filter(likes::Column::UserId.eq(user_id))
        .order_by_asc(likes::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.event_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::insert_user;
    use crate::database::test_pool;
    use crate::entities::UserLevel;
    use chrono::Duration;

    async fn setup() -> (DatabaseConnection, EventService, i64) {
        let pool = test_pool().await;
        let svc = EventService::new(pool.clone(), SettingsService::new(pool.clone()));
        let event = svc
            .create_event(CreateEventRequest {
                title: "Women in tech meetup".into(),
                date: Utc::now() + Duration::days(7),
                location: Some("Tel Aviv".into()),
                category: Some("networking".into()),
                price: 0,
                image: None,
                is_hero: false,
            })
            .await
            .unwrap();
        (pool, svc, event.id)
    }

    #[tokio::test]
    async fn test_join_awards_once() {
        let (pool, svc, event_id) = setup().await;
        let user = insert_user(&pool, "j@example.com", 0, UserLevel::Beginner).await;

        let joined = svc.join_event(user.id, event_id).await.unwrap();
        assert_eq!(joined.points_awarded, 10);
        assert_eq!(joined.balance, 10);

        let err = svc.join_event(user.id, event_id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyJoined));

        let listed = svc.list_events().await.unwrap();
        assert_eq!(listed[0].attendees_count, 1);
    }

    #[tokio::test]
    async fn test_repeat_share_awards_zero() {
        let (pool, svc, event_id) = setup().await;
        let user = insert_user(&pool, "s@example.com", 0, UserLevel::Beginner).await;

        let first = svc.share_event(user.id, event_id).await.unwrap();
        assert_eq!(first.points_awarded, 5);
        let second = svc.share_event(user.id, event_id).await.unwrap();
        assert_eq!(second.points_awarded, 0);
        assert_eq!(second.balance, 5);
    }

    #[tokio::test]
    async fn test_toggle_like() {
        let (pool, svc, event_id) = setup().await;
        let user = insert_user(&pool, "l@example.com", 0, UserLevel::Beginner).await;

        let liked = svc.toggle_like(user.id, event_id).await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.liked_event_ids, vec![event_id]);

        let unliked = svc.toggle_like(user.id, event_id).await.unwrap();
        assert!(!unliked.liked);
        assert!(unliked.liked_event_ids.is_empty());
    }

    #[tokio::test]
    async fn test_rating_replaces_previous_value() {
        let (pool, svc, event_id) = setup().await;
        let dana = insert_user(&pool, "dana@example.com", 0, UserLevel::Beginner).await;
        let noa = insert_user(&pool, "noa@example.com", 0, UserLevel::Beginner).await;

        let first = svc
            .rate_event(dana.id, event_id, RateEventRequest { rating: 3 })
            .await
            .unwrap();
        assert_eq!(first.ratings_count, 1);
        assert_eq!(first.average_rating, Some(3.0));

        svc.rate_event(noa.id, event_id, RateEventRequest { rating: 4 })
            .await
            .unwrap();
        let replaced = svc
            .rate_event(dana.id, event_id, RateEventRequest { rating: 5 })
            .await
            .unwrap();
        assert_eq!(replaced.ratings_count, 2);
        assert_eq!(replaced.average_rating, Some(4.5));

        let event = svc.get_event(event_id).await.unwrap();
        assert_eq!(event.ratings_count, 2);
        assert_eq!(event.average_rating, Some(4.5));
        assert_eq!(svc.list_events().await.unwrap()[0].average_rating, Some(4.5));
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let (pool, svc, event_id) = setup().await;
        let user = insert_user(&pool, "r@example.com", 0, UserLevel::Beginner).await;
        for rating in [0, 6] {
            assert!(matches!(
                svc.rate_event(user.id, event_id, RateEventRequest { rating }).await,
                Err(AppError::ValidationError(_))
            ));
        }
        assert!(matches!(
            svc.rate_event(user.id, 404, RateEventRequest { rating: 4 }).await,
            Err(AppError::NotFound(_))
        ));

        let event = svc.get_event(event_id).await.unwrap();
        assert_eq!(event.ratings_count, 0);
        assert_eq!(event.average_rating, None);
    }

    #[tokio::test]
    async fn test_missing_event() {
        let (pool, svc, _) = setup().await;
        let user = insert_user(&pool, "m@example.com", 0, UserLevel::Beginner).await;
        assert!(matches!(
            svc.join_event(user.id, 404).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete_event(404).await, Err(AppError::NotFound(_))));
    }
}
