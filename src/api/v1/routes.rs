/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は公開、/me は Bearer 必須
 * - Bearer が必要な範囲はここで決め、middleware::auth::access::apply を掛ける
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, me::me};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = middleware::auth::access::apply(Router::new().route("/me", get(me)), state);

    Router::new().route("/health", get(health)).merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::services::auth::AuthService;

    const SECRET: &str = "routes-test-secret";

    fn app() -> Router {
        let state = AppState::new(Arc::new(AuthService::new(SECRET, 60)));
        Router::new()
            .nest("/api/v1", routes(state.clone()))
            .with_state(state)
    }

    #[tokio::test]
    async fn health_does_not_require_credentials() {
        let res = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn me_requires_credentials() {
        let res = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_echoes_the_authenticated_principal() {
        let claims = json!({
            "userId": 1,
            "email": "a@b.com",
            "companyId": 2,
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let res = app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "userId": 1, "email": "a@b.com", "companyId": 2 }));
    }
}
