use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
};
use fyzen_web::{
    AppConfig, AppState, DataAccessCache, create_router,
    config::Env,
    gate::ACCESS_DENIED_PATH,
    session::{Claims, JwtSessionResolver, ResolveError, SessionResolver},
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::SystemTime;
use tower::ServiceExt;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs a token that expires `exp_offset` seconds from now (negative for the past).
fn create_token(email: &str, role: Option<&str>, exp_offset: i64) -> String {
    let now = now();
    let claims = Claims {
        sub: "user-1".to_string(),
        email: Some(email.to_string()),
        role_name: role.map(str::to_string),
        iat: now as usize,
        exp: (now as i64 + exp_offset) as usize,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn resolver(env: Env) -> JwtSessionResolver {
    JwtSessionResolver::new(TEST_JWT_SECRET, "fyzen_session", env)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

fn production_app() -> axum::Router {
    let mut config = AppConfig::default();
    config.env = Env::Production;
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    let cache = DataAccessCache::new();
    create_router(AppState::assemble(config, &cache).unwrap())
}

// --- Resolver Tests ---

#[tokio::test]
async fn valid_bearer_token_resolves_email_and_role() {
    let token = create_token("a@x.com", Some("Diretor Executivo (CEO)"), 3600);

    let session = resolver(Env::Production)
        .get_session(&bearer(&token))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(session.email(), Some("a@x.com"));
    assert_eq!(session.role_name(), Some("Diretor Executivo (CEO)"));
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let token = create_token("a@x.com", Some("Designer"), 3600);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; fyzen_session={}", token)).unwrap(),
    );

    let session = resolver(Env::Production)
        .get_session(&headers)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(session.role_name(), Some("Designer"));
}

#[tokio::test]
async fn unrelated_cookies_mean_no_session() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));

    let session = resolver(Env::Production).get_session(&headers).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let token = create_token("a@x.com", Some("Diretor Executivo (CEO)"), -3600);

    let err = resolver(Env::Production)
        .get_session(&bearer(&token))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Expired));
}

#[tokio::test]
async fn token_signed_with_another_secret_is_invalid() {
    let token = create_token("a@x.com", Some("Diretor Executivo (CEO)"), 3600);

    let err = JwtSessionResolver::new("some-other-secret", "fyzen_session", Env::Production)
        .get_session(&bearer(&token))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::InvalidToken(_)));
}

// --- End-to-end Through the Router ---

#[tokio::test]
async fn signed_in_coo_reaches_the_dashboard() {
    let token = create_token("coo@fyzen.com", Some("Diretor Operacional (COO)"), 3600);
    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = production_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_ceo_token_is_redirected() {
    let token = create_token("a@x.com", Some("Diretor Executivo (CEO)"), -3600);
    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = production_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        ACCESS_DENIED_PATH
    );
}

#[tokio::test]
async fn dev_headers_cannot_open_the_admin_area_in_production() {
    let request = Request::builder()
        .uri("/admin")
        .header("x-user-email", "a@x.com")
        .header("x-user-role", "Diretor Executivo (CEO)")
        .body(Body::empty())
        .unwrap();

    let response = production_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn signed_in_designer_cannot_promote_themself_with_dev_headers() {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config.dev_bypass = true;
    let cache = DataAccessCache::new();
    let app = create_router(AppState::assemble(config, &cache).unwrap());

    let token = create_token("b@x.com", Some("Designer"), 3600);
    let request = Request::builder()
        .uri("/admin")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("x-user-role", "Diretor Executivo (CEO)")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        ACCESS_DENIED_PATH
    );
}

#[tokio::test]
async fn session_endpoint_echoes_the_resolved_session() {
    let token = create_token("b@x.com", Some("Designer"), 3600);
    let request = Request::builder()
        .uri("/api/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = production_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["user"]["email"], "b@x.com");
    assert_eq!(json["user"]["roleName"], "Designer");
}

#[tokio::test]
async fn session_endpoint_returns_null_for_a_bad_token() {
    let request = Request::builder()
        .uri("/api/session")
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();

    let response = production_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"null");
}
