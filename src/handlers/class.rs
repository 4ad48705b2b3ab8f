use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::ClassService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/classes",
    tag = "classes",
    responses(
        (status = 200, description = "Class list", body = [ClassResponse])
    )
)]
pub async fn list_classes(class_service: web::Data<ClassService>) -> Result<HttpResponse> {
    match class_service.list_classes().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "classes",
    params(("id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = ClassResponse),
        (status = 404, description = "Class not found")
    )
)]
pub async fn get_class(
    class_service: web::Data<ClassService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match class_service.get_class(path.into_inner()).await {
        Ok(class) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": class }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/classes",
    tag = "classes",
    request_body = CreateClassRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Created", body = ClassResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_class(
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    request: web::Json<CreateClassRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match class_service.create_class(request.into_inner()).await {
        Ok(class) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": class }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/classes/{id}",
    tag = "classes",
    params(("id" = i64, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated", body = ClassResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn update_class(
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateClassRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match class_service
        .update_class(path.into_inner(), request.into_inner())
        .await
    {
        Ok(class) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": class }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/classes/{id}",
    tag = "classes",
    params(("id" = i64, Path, description = "Class ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn delete_class(
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    let class_id = path.into_inner();
    match class_service.delete_class(class_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": class_id }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn class_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/classes")
            .route("", web::get().to(list_classes))
            .route("", web::post().to(create_class))
            .route("/{id}", web::get().to(get_class))
            .route("/{id}", web::put().to(update_class))
            .route("/{id}", web::delete().to(delete_class)),
    );
}
