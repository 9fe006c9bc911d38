/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → 検証 → 拒否)
 * - 成功時に認証済み主体 (AuthCtx) を request extensions に載せる
 * - 認可 (Authorization) は handler/service 側の責務
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Apply request authentication to every route of the given router.
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum の from_fn は State extractor を受け取れないため、from_fn_with_state で明示的に渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Header extraction, signature and expiry checks all live in AuthService.
    // This layer only logs the failure class (never token contents) and
    // shapes the HTTP response.
    let principal = match state.auth.authenticate(req.headers()) {
        Ok(principal) => principal,
        Err(err) => {
            tracing::warn!(error = ?err, "request authentication failed");
            return Err(err.into());
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(principal));

    Ok(next.run(req).await)
}
