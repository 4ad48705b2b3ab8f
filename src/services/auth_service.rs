use crate::entities::{PointsReason, UserLevel, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::services::event_service::liked_event_ids;
use crate::services::{PointsService, SettingsService};
use crate::utils::*;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

const DICEBEAR_AVATAR_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    settings_service: SettingsService,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        settings_service: SettingsService,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            settings_service,
        }
    }

    /// 注册
    ///
    /// 用户创建与注册积分发放在同一事务内，失败时不会留下没有积分的账号。
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        // 验证输入参数
        let name = request.name.trim().to_string();
        let name_len = name.chars().count();
        if !(2..=50).contains(&name_len) {
            return Err(AppError::ValidationError(
                "Name length must be between 2 and 50 characters".to_string(),
            ));
        }
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;
        if let Some(phone) = &request.phone {
            validate_phone(phone)?;
        }

        let config = self.settings_service.get_config().await?;
        let password_hash = hash_password(&request.password)?;

        let txn = self.pool.begin().await?;

        let now = Utc::now();
        let inserted = users::Entity::insert(users::ActiveModel {
            name: Set(name),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            phone: Set(request.phone.map(|p| p.trim().to_string())),
            address: Set(request.address),
            communication_pref: Set(request.communication_pref.unwrap_or_default()),
            avatar: Set(Some(default_avatar(&email))),
            points: Set(0),
            level: Set(UserLevel::Beginner),
            is_admin: Set(false),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(users::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        if inserted == 0 {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let user = Self::find_by_email(&txn, &email)
            .await?
            .ok_or_else(|| AppError::InternalError("Registered user not found".to_string()))?;

        PointsService::grant_points_tx(
            &txn,
            user.id,
            config.points_per_register,
            PointsReason::Register,
            None,
        )
        .await?;
        let user = Self::find_by_email(&txn, &email)
            .await?
            .ok_or_else(|| AppError::InternalError("Registered user not found".to_string()))?;

        txn.commit().await?;

        log::info!("User {} registered", user.id);
        self.issue_tokens(user, Vec::new())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);

        let user = Self::find_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        let liked = liked_event_ids(&self.pool, user.id).await?;
        self.issue_tokens(user, liked)
    }

    /// 使用 refresh token 换取新的令牌；管理员标记以数据库为准
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        let liked = liked_event_ids(&self.pool, user.id).await?;
        self.issue_tokens(user, liked)
    }

    fn issue_tokens(&self, user: users::Model, liked: Vec<i64>) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, user.is_admin)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, user.is_admin)?;

        let mut user_response = UserResponse::from(user);
        user_response.liked_event_ids = liked;

        Ok(AuthResponse {
            user: user_response,
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    async fn find_by_email<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(conn)
            .await?;
        Ok(user)
    }
}

fn default_avatar(email: &str) -> String {
    let seed: String = email
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{DICEBEAR_AVATAR_URL}{seed}")
}
