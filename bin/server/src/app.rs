//! HTTP router assembly.

use axum::{
    Router,
    http::{
        HeaderValue, Method, StatusCode,
        header::{self, InvalidHeaderValue},
    },
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::auth::{AppState, routes as auth};
use crate::config::{Environment, ServerConfig};
use crate::rate_limit::{RateLimiter, limit_requests};
use crate::team_members;

/// Builds the full application router. Every route lives under `/api`.
///
/// # Errors
///
/// Returns an error if the frontend URL is not a valid CORS origin.
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Result<Router, InvalidHeaderValue> {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&state.frontend_url)?)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    let window = Duration::from_secs(config.rate_limit.window_seconds);
    let trust_forwarded = state.environment == Environment::Production;
    let global_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_requests,
        window,
        trust_forwarded,
    ));
    let auth_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_auth_requests,
        window,
        trust_forwarded,
    ));

    let auth_routes = Router::new()
        .route("/google", get(auth::google_start))
        .route("/google/callback", get(auth::google_callback))
        .route("/dev-login", post(auth::dev_login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(middleware::from_fn_with_state(auth_limiter, limit_requests));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .nest("/team-members", team_members::routes());

    let router = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(global_limiter, limit_requests))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_seconds),
        ))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, GoogleOAuthConfig, RateLimitConfig, SessionConfig};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::SET_COOKIE},
        response::Response,
    };
    use chrono::Utc;
    use serde_json::{Value, json};
    use team_pulse_core::AccountId;
    use team_pulse_platform_access::{
        AccessClaims, AuthService, MemoryStore, Role, TeamMember, TeamMemberStore, TokenCodec,
    };
    use tower::ServiceExt;

    fn config(environment: Environment) -> ServerConfig {
        ServerConfig {
            database_url: "postgres://unused".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            environment,
            frontend_url: "http://localhost:5173".to_string(),
            request_timeout_seconds: 5,
            max_body_bytes: 10 * 1024,
            auth: AuthConfig {
                access_token_secret: "access-secret".to_string(),
                access_token_ttl_minutes: 15,
                refresh_token_secret: "refresh-secret".to_string(),
                refresh_token_ttl_days: 7,
            },
            google: GoogleOAuthConfig::default(),
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    struct TestApp {
        store: Arc<MemoryStore>,
        state: Arc<AppState>,
        router: Router,
    }

    fn test_app(environment: Environment) -> TestApp {
        test_app_with(config(environment))
    }

    fn test_app_with(config: ServerConfig) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            TokenCodec::new(config.auth.token_settings()),
        );
        let state = Arc::new(AppState::new(&config, service, store.clone(), None));
        let router = router(state.clone(), &config).unwrap();
        TestApp {
            store,
            state,
            router,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn login(&self, email: &str) -> (String, String) {
            let response = self
                .send(json_request(
                    "POST",
                    "/api/auth/dev-login",
                    None,
                    json!({ "email": email }),
                ))
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            let refresh = refresh_cookie(&response).expect("refresh cookie");
            let body = body_json(response).await;
            (
                body["accessToken"].as_str().unwrap().to_string(),
                refresh,
            )
        }

        async fn add_member(&self, name: &str, email: &str, role: Role) -> TeamMember {
            let member = TeamMember::new(name.into(), email.into(), role, 40);
            self.store.insert_member(&member).await.unwrap();
            member
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        cookie: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("refreshToken={cookie}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookie_headers(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    fn refresh_cookie(response: &Response) -> Option<String> {
        set_cookie_headers(response).into_iter().find_map(|header| {
            let rest = header.strip_prefix("refreshToken=")?;
            let value = rest.split(';').next()?;
            (!value.is_empty()).then(|| value.to_string())
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app(Environment::Development);
        let response = app.send(empty_request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dev_login_sets_refresh_cookie_and_returns_access_token() {
        let app = test_app(Environment::Development);
        app.add_member("Alice", "a@x.com", Role::Manager).await;

        let response = app
            .send(json_request(
                "POST",
                "/api/auth/dev-login",
                None,
                json!({ "email": "a@x.com" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = set_cookie_headers(&response)
            .into_iter()
            .find(|c| c.starts_with("refreshToken="))
            .expect("refresh cookie");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let body = body_json(response).await;
        assert_eq!(body["user"]["role"], "manager");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert_eq!(body["user"]["displayName"], "a");

        let claims: AccessClaims = app
            .state
            .auth
            .codec()
            .verify(body["accessToken"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.role, Role::Manager);
    }

    #[tokio::test]
    async fn dev_login_is_hidden_outside_development() {
        let app = test_app(Environment::Production);
        let response = app
            .send(json_request(
                "POST",
                "/api/auth/dev-login",
                None,
                json!({ "email": "a@x.com" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dev_login_requires_an_email() {
        let app = test_app(Environment::Development);
        let response = app
            .send(json_request("POST", "/api/auth/dev-login", None, json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Email required");
    }

    #[tokio::test]
    async fn me_requires_a_valid_bearer_token() {
        let app = test_app(Environment::Development);

        let response = app.send(empty_request("GET", "/api/auth/me", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .send(empty_request("GET", "/api/auth/me", Some("garbage"), None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Invalid token");

        let expired = app
            .state
            .auth
            .codec()
            .mint(&AccessClaims::new(
                AccountId::new(),
                "a@x.com".into(),
                Role::Member,
                None,
                Utc::now(),
                chrono::Duration::seconds(-5),
            ))
            .unwrap();
        let response = app
            .send(empty_request("GET", "/api/auth/me", Some(&expired), None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Token expired");
    }

    #[tokio::test]
    async fn me_returns_the_current_user() {
        let app = test_app(Environment::Development);
        app.add_member("Alice", "a@x.com", Role::Admin).await;
        let (access, _) = app.login("a@x.com").await;

        let response = app
            .send(empty_request("GET", "/api/auth/me", Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["role"], "admin");
        assert_eq!(body["teamMember"]["name"], "Alice");
    }

    #[tokio::test]
    async fn refresh_via_cookie_rotates_and_rejects_reuse() {
        let app = test_app(Environment::Development);
        let (_, refresh) = app.login("a@x.com").await;

        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&refresh)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let rotated = refresh_cookie(&response).expect("new cookie");
        assert_ne!(rotated, refresh);
        assert!(body_json(response).await["accessToken"].is_string());

        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&refresh)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "Invalid or expired refresh token"
        );
    }

    #[tokio::test]
    async fn refresh_accepts_token_in_body() {
        let app = test_app(Environment::Development);
        let (_, refresh) = app.login("a@x.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/api/auth/refresh",
                None,
                json!({ "refreshToken": refresh }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_without_token_is_a_bad_request() {
        let app = test_app(Environment::Development);
        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, None))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Refresh token required");
    }

    #[tokio::test]
    async fn logout_with_cookie_revokes_only_that_session() {
        let app = test_app(Environment::Development);
        let (access, laptop) = app.login("a@x.com").await;
        let (_, phone) = app.login("a@x.com").await;

        let response = app
            .send(empty_request("POST", "/api/auth/logout", Some(&access), Some(&laptop)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            set_cookie_headers(&response)
                .iter()
                .any(|c| c.starts_with("refreshToken=;") && c.contains("Max-Age=0"))
        );
        assert_eq!(
            body_json(response).await["message"],
            "Logged out successfully"
        );

        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&laptop)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&phone)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_without_cookie_revokes_everything() {
        let app = test_app(Environment::Development);
        let (access, laptop) = app.login("a@x.com").await;
        let (_, phone) = app.login("a@x.com").await;

        let response = app
            .send(empty_request("POST", "/api/auth/logout", Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.store.session_count().await, 0);

        for token in [laptop, phone] {
            let response = app
                .send(empty_request("POST", "/api/auth/refresh", None, Some(&token)))
                .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn logout_requires_authentication() {
        let app = test_app(Environment::Development);
        let response = app
            .send(empty_request("POST", "/api/auth/logout", None, None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn members_cannot_create_roster_entries() {
        let app = test_app(Environment::Development);
        let (access, _) = app.login("m@x.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/api/team-members",
                Some(&access),
                json!({ "name": "Bob", "email": "b@x.com" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Insufficient permissions");
        assert_eq!(body["required"], json!(["admin", "manager"]));
        assert_eq!(body["current"], "member");
    }

    #[tokio::test]
    async fn managers_manage_roster_but_only_admins_deactivate() {
        let app = test_app(Environment::Development);
        app.add_member("Mia", "mia@x.com", Role::Manager).await;
        app.add_member("Ada", "ada@x.com", Role::Admin).await;
        let (manager, _) = app.login("mia@x.com").await;
        let (admin, _) = app.login("ada@x.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/api/team-members",
                Some(&manager),
                json!({ "name": "Bob", "email": "b@x.com", "weeklyHours": 32 }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["role"], "member");
        assert_eq!(created["weeklyHours"], 32);
        let id = created["id"].as_str().unwrap().to_string();

        let response = app
            .send(json_request(
                "POST",
                "/api/team-members",
                Some(&manager),
                json!({ "name": "Bobby", "email": "b@x.com" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .send(json_request(
                "PUT",
                &format!("/api/team-members/{id}"),
                Some(&manager),
                json!({ "role": "manager" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["role"], "manager");

        let uri = format!("/api/team-members/{id}");
        let response = app
            .send(empty_request("DELETE", &uri, Some(&manager), None))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send(empty_request("DELETE", &uri, Some(&admin), None))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .send(empty_request("GET", "/api/team-members", Some(&manager), None))
            .await;
        let names: Vec<Value> = body_json(response).await.as_array().unwrap().iter().map(|m| m["name"].clone()).collect();
        assert_eq!(names, [json!("Ada"), json!("Mia")]);

        let response = app
            .send(empty_request(
                "GET",
                "/api/team-members?includeInactive=true",
                Some(&manager),
                None,
            ))
            .await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn roster_input_is_validated() {
        let app = test_app(Environment::Development);
        app.add_member("Ada", "ada@x.com", Role::Admin).await;
        let (admin, _) = app.login("ada@x.com").await;

        let response = app
            .send(json_request(
                "POST",
                "/api/team-members",
                Some(&admin),
                json!({ "name": "", "email": "not-an-email", "weeklyHours": 200 }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(json_request(
                "PUT",
                "/api/team-members/tm_01ARZ3NDEKTSV4RRFFQ69G5FAV",
                Some(&admin),
                json!({}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(empty_request(
                "GET",
                "/api/team-members/tm_01ARZ3NDEKTSV4RRFFQ69G5FAV",
                Some(&admin),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn link_uri(member: &TeamMember) -> String {
        format!("/api/team-members/{}/link-user", member.id())
    }

    #[tokio::test]
    async fn link_user_cannot_take_over_another_roster_entry() {
        let app = test_app(Environment::Development);
        let boss = app.add_member("Boss", "boss@x.com", Role::Admin).await;
        let retired = app.add_member("Retired", "retired@x.com", Role::Admin).await;
        assert!(app.store.deactivate(retired.id()).await.unwrap());
        let (access, refresh) = app.login("intruder@x.com").await;

        let response = app
            .send(empty_request("POST", &link_uri(&boss), Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send(empty_request("POST", &link_uri(&retired), Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&refresh)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"]["role"], "member");

        let boss = app.store.find_member(boss.id()).await.unwrap().unwrap();
        assert_eq!(boss.account_id(), None);
    }

    #[tokio::test]
    async fn link_user_rejects_second_link_for_same_account() {
        let app = test_app(Environment::Development);
        let first = app.add_member("One", "one@x.com", Role::Member).await;
        let (access, _) = app.login("one@x.com").await;

        // Already claimed at login; relinking the same pair is a no-op.
        let response = app
            .send(empty_request("POST", &link_uri(&first), Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut renamed = app.store.find_member(first.id()).await.unwrap().unwrap();
        renamed.set_email("old@x.com".to_string());
        app.store.update_member(&renamed).await.unwrap();
        let second = app.add_member("Two", "one@x.com", Role::Member).await;

        let response = app
            .send(empty_request("POST", &link_uri(&second), Some(&access), None))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await["error"],
            "User is already linked to another team member"
        );
    }

    #[tokio::test]
    async fn storage_outage_is_an_internal_error() {
        let app = test_app(Environment::Development);
        let (_, refresh) = app.login("a@x.com").await;
        app.store.set_unavailable(true);

        let response = app
            .send(empty_request("POST", "/api/auth/refresh", None, Some(&refresh)))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn google_login_without_configuration_is_unavailable() {
        let app = test_app(Environment::Development);
        let response = app
            .send(empty_request("GET", "/api/auth/google", None, None))
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn google_callback_failure_redirects_to_frontend_error_page() {
        let app = test_app(Environment::Development);
        let response = app
            .send(empty_request(
                "GET",
                "/api/auth/google/callback?error=access_denied",
                None,
                None,
            ))
            .await;
        assert!(response.status().is_redirection());
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://localhost:5173/auth/error?message="));
        assert!(location.contains("access_denied"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = test_app(Environment::Development);
        let body = json!({ "refreshToken": "x".repeat(20 * 1024) }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn auth_routes_are_rate_limited_separately() {
        let mut config = config(Environment::Development);
        config.rate_limit.max_auth_requests = 2;
        let app = test_app_with(config);

        for _ in 0..2 {
            let response = app.send(empty_request("GET", "/api/auth/me", None, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        let response = app.send(empty_request("GET", "/api/auth/me", None, None)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));

        let response = app.send(empty_request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn global_rate_limit_covers_every_route() {
        let mut config = config(Environment::Development);
        config.rate_limit.max_requests = 1;
        let app = test_app_with(config);

        let response = app.send(empty_request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.send(empty_request("GET", "/api/health", None, None)).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let app = test_app(Environment::Development);
        let response = app.send(empty_request("GET", "/api/health", None, None)).await;

        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
    }

    #[tokio::test]
    async fn trailing_slash_in_frontend_url_is_ignored() {
        let mut config = config(Environment::Development);
        config.frontend_url = "http://localhost:5173/".to_string();
        let app = test_app_with(config);

        let response = app
            .send(empty_request(
                "GET",
                "/api/auth/google/callback?error=access_denied",
                None,
                None,
            ))
            .await;
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://localhost:5173/auth/error?"));

        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }
}
