use crate::entities::class_entity as classes;
use crate::error::{AppError, AppResult};
use crate::models::{ClassResponse, CreateClassRequest, UpdateClassRequest};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

#[derive(Clone)]
pub struct ClassService {
    pool: DatabaseConnection,
}

impl ClassService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 课程列表（按创建先后）
    pub async fn list_classes(&self) -> AppResult<Vec<ClassResponse>> {
        let list = classes::Entity::find()
            .order_by_asc(classes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(ClassResponse::from).collect())
    }

    pub async fn get_class(&self, class_id: i64) -> AppResult<ClassResponse> {
        Ok(self.find_class(class_id).await?.into())
    }

    pub async fn create_class(&self, request: CreateClassRequest) -> AppResult<ClassResponse> {
        let title = required_title(&request.title)?;
        validate_price(request.price)?;

        let now = Utc::now();
        let model = classes::ActiveModel {
            title: Set(title),
            instructor: Set(optional_text(request.instructor)),
            contact_phone: Set(optional_text(request.contact_phone)),
            day: Set(optional_text(request.day)),
            time: Set(optional_text(request.time)),
            location: Set(optional_text(request.location)),
            price: Set(request.price),
            age_group: Set(optional_text(request.age_group)),
            image: Set(request.image),
            category: Set(optional_text(request.category)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Class {} created", model.id);
        Ok(model.into())
    }

    /// 部分更新；传入空字符串会清空对应的可选字段
    pub async fn update_class(
        &self,
        class_id: i64,
        request: UpdateClassRequest,
    ) -> AppResult<ClassResponse> {
        let mut am = self.find_class(class_id).await?.into_active_model();

        if let Some(title) = request.title {
            am.title = Set(required_title(&title)?);
        }
        if let Some(price) = request.price {
            validate_price(price)?;
            am.price = Set(price);
        }
        if let Some(instructor) = request.instructor {
            am.instructor = Set(optional_text(Some(instructor)));
        }
        if let Some(phone) = request.contact_phone {
            am.contact_phone = Set(optional_text(Some(phone)));
        }
        if let Some(day) = request.day {
            am.day = Set(optional_text(Some(day)));
        }
        if let Some(time) = request.time {
            am.time = Set(optional_text(Some(time)));
        }
        if let Some(location) = request.location {
            am.location = Set(optional_text(Some(location)));
        }
        if let Some(age_group) = request.age_group {
            am.age_group = Set(optional_text(Some(age_group)));
        }
        if let Some(image) = request.image {
            am.image = Set(optional_text(Some(image)));
        }
        if let Some(category) = request.category {
            am.category = Set(optional_text(Some(category)));
        }
        am.updated_at = Set(Some(Utc::now()));

        Ok(am.update(&self.pool).await?.into())
    }

    pub async fn delete_class(&self, class_id: i64) -> AppResult<()> {
        let res = classes::Entity::delete_by_id(class_id)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Class not found".into()));
        }

        log::info!("Class {class_id} deleted");
        Ok(())
    }

    async fn find_class(&self, class_id: i64) -> AppResult<classes::Model> {
        classes::Entity::find_by_id(class_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Class not found".into()))
    }
}

fn required_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError("title is required".into()));
    }
    Ok(title.to_string())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::ValidationError("price must not be negative".into()));
    }
    Ok(())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn pilates() -> CreateClassRequest {
        CreateClassRequest {
            title: "  Pilates for beginners ".into(),
            instructor: Some("Michal".into()),
            contact_phone: Some("050-1234567".into()),
            day: Some("Sunday".into()),
            time: Some("18:30".into()),
            location: Some("Haifa community center".into()),
            price: 40,
            age_group: Some("".into()),
            image: None,
            category: Some("sport".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let svc = ClassService::new(test_pool().await);
        let created = svc.create_class(pilates()).await.unwrap();
        assert_eq!(created.title, "Pilates for beginners");
        assert_eq!(created.age_group, None);

        let listed = svc.list_classes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].day.as_deref(), Some("Sunday"));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let svc = ClassService::new(test_pool().await);
        let created = svc.create_class(pilates()).await.unwrap();

        let updated = svc
            .update_class(
                created.id,
                UpdateClassRequest {
                    time: Some("19:00".into()),
                    instructor: Some(" ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.time.as_deref(), Some("19:00"));
        assert_eq!(updated.instructor, None);
        assert_eq!(updated.price, 40);
        assert_eq!(updated.location.as_deref(), Some("Haifa community center"));

        let err = svc
            .update_class(
                created.id,
                UpdateClassRequest {
                    price: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_validation_and_delete() {
        let svc = ClassService::new(test_pool().await);
        let err = svc
            .create_class(CreateClassRequest {
                title: "   ".into(),
                ..pilates()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let created = svc.create_class(pilates()).await.unwrap();
        svc.delete_class(created.id).await.unwrap();
        assert!(matches!(svc.get_class(created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete_class(created.id).await, Err(AppError::NotFound(_))));
    }
}
