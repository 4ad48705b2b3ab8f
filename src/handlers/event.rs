use crate::middlewares::{current_user, require_admin};
use crate::models::*;
use crate::services::EventService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    responses(
        (status = 200, description = "Event list", body = [EventResponse])
    )
)]
pub async fn list_events(event_service: web::Data<EventService>) -> Result<HttpResponse> {
    match event_service.list_events().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match event_service.get_event(path.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": event }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    request_body = CreateEventRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Created", body = EventResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match event_service.create_event(request.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": event }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated", body = EventResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match event_service
        .update_event(path.into_inner(), request.into_inner())
        .await
    {
        Ok(event) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": event }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    let event_id = path.into_inner();
    match event_service.delete_event(event_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "id": event_id }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events/{id}/join",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Joined and points awarded", body = EventPointsResponse),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already joined")
    )
)]
pub async fn join_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.join_event(user.id, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events/{id}/share",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Share recorded (points_awarded = 0 on repeat shares)", body = EventPointsResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn share_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.share_event(user.id, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events/{id}/like",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeEventResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn like_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.toggle_like(user.id, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events/{id}/rating",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = RateEventRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rating saved", body = EventRatingResponse),
        (status = 400, description = "Rating must be between 1 and 5"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn rate_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RateEventRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service
        .rate_event(user.id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}", web::put().to(update_event))
            .route("/{id}", web::delete().to(delete_event))
            .route("/{id}/join", web::post().to(join_event))
            .route("/{id}/share", web::post().to(share_event))
            .route("/{id}/like", web::post().to(like_event))
            .route("/{id}/rating", web::post().to(rate_event)),
    );
}
