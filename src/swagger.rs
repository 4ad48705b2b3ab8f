use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    CommunicationPref, EligibilityType, LotteryStatus, PointsReason, UserLevel,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::points_history,
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::event::create_event,
        handlers::event::update_event,
        handlers::event::delete_event,
        handlers::event::join_event,
        handlers::event::share_event,
        handlers::event::like_event,
        handlers::event::rate_event,
        handlers::class::list_classes,
        handlers::class::get_class,
        handlers::class::create_class,
        handlers::class::update_class,
        handlers::class::delete_class,
        handlers::lottery::list_lotteries,
        handlers::lottery::get_lottery,
        handlers::lottery::create_lottery,
        handlers::lottery::update_lottery,
        handlers::lottery::delete_lottery,
        handlers::lottery::check_eligibility,
        handlers::lottery::enter_lottery,
        handlers::lottery::draw_lottery,
        handlers::gift_code::redeem,
        handlers::admin::get_settings,
        handlers::admin::update_settings,
        handlers::admin::list_gift_codes,
        handlers::admin::create_gift_code,
        handlers::admin::list_users,
        handlers::admin::update_user,
        handlers::admin::adjust_points,
    ),
    components(
        schemas(
            UserLevel,
            CommunicationPref,
            EligibilityType,
            LotteryStatus,
            PointsReason,
            IneligibleKind,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            AdminUpdateUserRequest,
            UserResponse,
            AuthResponse,
            PaginatedUserResponse,
            PointsConfig,
            UpdatePointsConfigRequest,
            PointTransactionResponse,
            PointsHistoryPageResponse,
            AdminAdjustPointsRequest,
            PointsBalanceResponse,
            CreateGiftCodeRequest,
            GiftCodeResponse,
            CreateGiftCodeResponse,
            RedeemGiftCodeRequest,
            RedeemGiftCodeResponse,
            CreateEventRequest,
            UpdateEventRequest,
            EventResponse,
            EventPointsResponse,
            LikeEventResponse,
            RateEventRequest,
            EventRatingResponse,
            CreateClassRequest,
            UpdateClassRequest,
            ClassResponse,
            CreateLotteryRequest,
            UpdateLotteryRequest,
            LotteryResponse,
            EligibilityResponse,
            EnterLotteryResponse,
            DrawResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "user", description = "Member profile and points history"),
        (name = "events", description = "Community events"),
        (name = "classes", description = "Weekly classes"),
        (name = "lotteries", description = "Lotteries: eligibility, entry and draw"),
        (name = "gifts", description = "Gift code redemption"),
        (name = "admin", description = "Admin: points settings, gift codes, members"),
    ),
    info(
        title = "Nashi Backend API",
        version = "1.0.0",
        description = "Nashi community platform REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/lotteries/{id}/draw"));
        assert!(doc.paths.paths.contains_key("/admin/settings"));
        assert!(doc.paths.paths.contains_key("/classes/{id}"));
        assert!(doc.paths.paths.contains_key("/events/{id}/rating"));
    }
}
