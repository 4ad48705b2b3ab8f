//! 测试数据

use crate::entities::{UserLevel, user_entity as users};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

pub(crate) async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    points: i64,
    level: UserLevel,
) -> users::Model {
    users::ActiveModel {
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        communication_pref: Set(Default::default()),
        points: Set(points),
        level: Set(level),
        is_admin: Set(false),
        created_at: Set(Some(Utc::now())),
        updated_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(conn)
    .await
    .expect("insert test user")
}
