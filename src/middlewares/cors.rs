use actix_cors::Cors;

/// 前端与后台管理界面跨域访问
pub fn create_cors(frontend_base_url: &str) -> Cors {
    let origin = frontend_base_url.trim_end_matches('/').to_string();
    Cors::default()
        .allowed_origin(&origin)
        // 本地开发
        .allowed_origin_fn(|origin, _req_head| {
            origin
                .to_str()
                .is_ok_and(|o| o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1"))
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
