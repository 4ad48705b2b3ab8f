use crate::middlewares::{current_user, require_admin};
use crate::models::*;
use crate::services::LotteryService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/lotteries",
    tag = "lotteries",
    responses(
        (status = 200, description = "Lotteries with their participants", body = [LotteryResponse])
    )
)]
pub async fn list_lotteries(lottery_service: web::Data<LotteryService>) -> Result<HttpResponse> {
    match lottery_service.list_lotteries().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lotteries/{id}",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    responses(
        (status = 200, description = "Lottery details", body = LotteryResponse),
        (status = 404, description = "Lottery not found")
    )
)]
pub async fn get_lottery(
    lottery_service: web::Data<LotteryService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match lottery_service.get_lottery(path.into_inner()).await {
        Ok(lottery) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": lottery }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/lotteries",
    tag = "lotteries",
    request_body = CreateLotteryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Created", body = LotteryResponse),
        (status = 400, description = "Incomplete eligibility rule"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_lottery(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    request: web::Json<CreateLotteryRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match lottery_service.create_lottery(request.into_inner()).await {
        Ok(lottery) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": lottery }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/lotteries/{id}",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    request_body = UpdateLotteryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated", body = LotteryResponse),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Lottery already drawn and can no longer be edited")
    )
)]
pub async fn update_lottery(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateLotteryRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match lottery_service
        .update_lottery(path.into_inner(), request.into_inner())
        .await
    {
        Ok(lottery) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": lottery }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/lotteries/{id}",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Lottery not found")
    )
)]
pub async fn delete_lottery(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    let lottery_id = path.into_inner();
    match lottery_service.delete_lottery(lottery_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": lottery_id }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/lotteries/{id}/eligibility",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Eligibility result with the error code when not eligible", body = EligibilityResponse),
        (status = 404, description = "Lottery not found")
    )
)]
pub async fn check_eligibility(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.check(user.id, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/lotteries/{id}/enter",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Entered", body = EnterLotteryResponse),
        (status = 400, description = "Insufficient points"),
        (status = 403, description = "Not eligible to enter"),
        (status = 409, description = "Already entered or lottery closed")
    )
)]
/// Enter a lottery; points lotteries charge their threshold
pub async fn enter_lottery(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match lottery_service.enter(user.id, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/lotteries/{id}/draw",
    tag = "lotteries",
    params(("id" = i64, Path, description = "Lottery ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Draw result (outcome = voided when nobody entered)", body = DrawResponse),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Lottery already drawn")
    )
)]
/// Draw a winner server-side; succeeds only once
pub async fn draw_lottery(
    lottery_service: web::Data<LotteryService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match lottery_service.draw(path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lotteries")
            .route("", web::get().to(list_lotteries))
            .route("", web::post().to(create_lottery))
            .route("/{id}", web::get().to(get_lottery))
            .route("/{id}", web::put().to(update_lottery))
            .route("/{id}", web::delete().to(delete_lottery))
            .route("/{id}/eligibility", web::get().to(check_eligibility))
            .route("/{id}/enter", web::post().to(enter_lottery))
            .route("/{id}/draw", web::post().to(draw_lottery)),
    );
}
