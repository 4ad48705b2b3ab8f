use crate::middlewares::current_user;
use crate::models::*;
use crate::services::GiftCodeService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/gifts/redeem",
    tag = "gifts",
    request_body = RedeemGiftCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Gift code redeemed", body = RedeemGiftCodeResponse),
        (status = 404, description = "Gift code not found"),
        (status = 409, description = "Already redeemed or usage limit reached"),
        (status = 410, description = "Gift code expired")
    )
)]
pub async fn redeem(
    gift_code_service: web::Data<GiftCodeService>,
    req: HttpRequest,
    request: web::Json<RedeemGiftCodeRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match gift_code_service.redeem(user.id, &request.code).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn gift_code_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/gifts").route("/redeem", web::post().to(redeem)));
}
