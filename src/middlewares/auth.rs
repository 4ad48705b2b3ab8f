use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 已认证的请求方，由中间件写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub is_admin: bool,
}

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // 仅 GET 公开的资源集合，集合本身与 `集合/{id}` 均可匿名访问
    public_get_collections: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
            public_get_collections: vec!["/api/v1/events", "/api/v1/lotteries", "/api/v1/classes"],
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }
        if method != Method::GET {
            return false;
        }

        let path = path.trim_end_matches('/');
        self.public_get_collections.iter().any(|&collection| {
            match path.strip_prefix(collection) {
                Some("") => true,
                Some(rest) => rest
                    .strip_prefix('/')
                    .is_some_and(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())),
                None => false,
            }
        })
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        if self.public_paths.is_public(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let user = self
            .jwt_service
            .verify_access_token(&token)
            .and_then(|claims| {
                Ok(AuthUser {
                    id: claims.user_id()?,
                    is_admin: claims.is_admin,
                })
            });

        match user {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(_) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// 获取当前登录用户
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
}

/// 获取当前用户并要求管理员权限
pub fn require_admin(req: &HttpRequest) -> AppResult<AuthUser> {
    let user = current_user(req)?;
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, ResponseError, test, web};

    #[::core::prelude::v1::test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public(&Method::POST, "/api/v1/auth/login"));
        assert!(paths.is_public(&Method::POST, "/api/v1/auth/refresh"));
        assert!(paths.is_public(&Method::GET, "/api/v1/events"));
        assert!(paths.is_public(&Method::GET, "/api/v1/lotteries/12"));
        assert!(paths.is_public(&Method::GET, "/swagger-ui/index.html"));

        assert!(paths.is_public(&Method::GET, "/api/v1/classes"));
        assert!(paths.is_public(&Method::GET, "/api/v1/classes/3"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/classes"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/events/3/rating"));
        assert!(!paths.is_public(&Method::POST, "/api/v1/events"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/lotteries/12/eligibility"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/user/profile"));
        assert!(!paths.is_public(&Method::GET, "/api/v1/admin/settings"));
    }

    async fn admin_only(req: HttpRequest) -> HttpResponse {
        match require_admin(&req) {
            Ok(user) => HttpResponse::Ok().body(user.id.to_string()),
            Err(e) => e.error_response(),
        }
    }

    #[actix_web::test]
    async fn test_middleware_injects_auth_user() {
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt.clone()))
                .route("/api/v1/admin/ping", web::get().to(admin_only)),
        )
        .await;

        // 无 token
        let req = test::TestRequest::get().uri("/api/v1/admin/ping").to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), 401);

        // 普通用户
        let token = jwt.generate_access_token(5, false).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        // 管理员
        let token = jwt.generate_access_token(9, true).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/v1/admin/ping")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "9");
    }
}
