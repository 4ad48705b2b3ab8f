//! 管理后台：积分配置、礼品码、用户管理

use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::{GiftCodeService, PointsService, SettingsService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current points settings (defaults are created when absent)", body = PointsConfig),
        (status = 403, description = "Admin only")
    )
)]
pub async fn get_settings(
    settings_service: web::Data<SettingsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match settings_service.get_config().await {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": config }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    request_body = UpdatePointsConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated points settings", body = PointsConfig),
        (status = 400, description = "Values must not be negative"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn update_settings(
    settings_service: web::Data<SettingsService>,
    req: HttpRequest,
    request: web::Json<UpdatePointsConfigRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match settings_service.update_config(request.into_inner()).await {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": config }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/gifts",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Gift codes", body = [GiftCodeResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_gift_codes(
    gift_code_service: web::Data<GiftCodeService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match gift_code_service.list_codes().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/gifts",
    tag = "admin",
    request_body = CreateGiftCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Created, with its redeem link", body = CreateGiftCodeResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Gift code already exists")
    )
)]
pub async fn create_gift_code(
    gift_code_service: web::Data<GiftCodeService>,
    req: HttpRequest,
    request: web::Json<CreateGiftCodeRequest>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&req) {
        Ok(admin) => admin,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_code_service
        .create_code(admin.id, request.into_inner())
        .await
    {
        Ok(created) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": created }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("page_size" = Option<i64>, Query, description = "Page size (default 20, max 100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member list", body = PaginatedUserResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match user_service.list_users(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match user_service
        .admin_update_user(path.into_inner(), request.into_inner())
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": user }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/points",
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AdminAdjustPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Balance after adjustment", body = PointsBalanceResponse),
        (status = 400, description = "Amount is zero or balance is insufficient"),
        (status = 404, description = "User not found")
    )
)]
/// Grant (positive) or deduct (negative) points for a member
pub async fn adjust_points(
    points_service: web::Data<PointsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AdminAdjustPointsRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match points_service
        .adjust_points(path.into_inner(), request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::post().to(get_settings))
            .route("/settings", web::put().to(update_settings))
            .route("/gifts", web::get().to(list_gift_codes))
            .route("/gifts", web::post().to(create_gift_code))
            .route("/users", web::get().to(list_users))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}/points", web::post().to(adjust_points)),
    );
}
