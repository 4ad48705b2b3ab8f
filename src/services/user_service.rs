use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminUpdateUserRequest, PaginatedResponse, PaginationParams, UpdateProfileRequest,
    UserResponse,
};
use crate::services::event_service::liked_event_ids;
use crate::utils::validate_phone;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 获取个人资料（含收藏的活动）
    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut response = UserResponse::from(user);
        response.liked_event_ids = liked_event_ids(&self.pool, user_id).await?;
        Ok(response)
    }

    /// 更新个人资料；积分、等级、管理员标记不能由用户本人修改
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut am = user.into_active_model();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if !(2..=50).contains(&name.chars().count()) {
                return Err(AppError::ValidationError(
                    "Name length must be between 2 and 50 characters".to_string(),
                ));
            }
            am.name = Set(name);
        }
        if let Some(phone) = request.phone {
            validate_phone(&phone)?;
            am.phone = Set(Some(phone.trim().to_string()));
        }
        if let Some(address) = request.address {
            am.address = Set(Some(address));
        }
        if let Some(pref) = request.communication_pref {
            am.communication_pref = Set(pref);
        }
        if let Some(avatar) = request.avatar {
            am.avatar = Set(Some(avatar));
        }
        am.updated_at = Set(Some(Utc::now()));

        am.update(&self.pool).await?;
        self.get_profile(user_id).await
    }

    /// 用户列表（管理员）
    pub async fn list_users(&self, params: &PaginationParams) -> AppResult<PaginatedResponse<UserResponse>> {
        let total = users::Entity::find().count(&self.pool).await? as i64;
        let items = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.page(),
            params.page_size(),
            total,
        ))
    }

    /// 修改等级 / 管理员标记（管理员）
    pub async fn admin_update_user(
        &self,
        user_id: i64,
        request: AdminUpdateUserRequest,
    ) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut am = user.into_active_model();
        if let Some(level) = request.level {
            am.level = Set(level);
        }
        if let Some(is_admin) = request.is_admin {
            am.is_admin = Set(is_admin);
        }
        am.updated_at = Set(Some(Utc::now()));

        let updated = am.update(&self.pool).await?;
        log::info!(
            "User {user_id} updated by admin: level={}, is_admin={}",
            updated.level,
            updated.is_admin
        );
        self.get_profile(user_id).await
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::insert_user;
    use crate::database::test_pool;
    use crate::entities::UserLevel;

    #[tokio::test]
    async fn test_update_profile_validates_phone() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "p@example.com", 0, UserLevel::Beginner).await;
        let svc = UserService::new(pool);

        let err = svc
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    phone: Some("12345".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let updated = svc
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    name: Some("Noa Levi".into()),
                    phone: Some("052-7654321".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Noa Levi");
        assert_eq!(updated.phone.as_deref(), Some("052-7654321"));
    }

    #[tokio::test]
    async fn test_admin_update_and_list() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "x@example.com", 0, UserLevel::Beginner).await;
        insert_user(&pool, "y@example.com", 0, UserLevel::Beginner).await;
        let svc = UserService::new(pool);

        let updated = svc
            .admin_update_user(
                user.id,
                AdminUpdateUserRequest {
                    level: Some(UserLevel::Leader),
                    is_admin: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.level, UserLevel::Leader);

        let page = svc
            .list_users(&PaginationParams::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total_pages, 2);
    }
}
