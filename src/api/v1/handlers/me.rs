/*
 * Responsibility
 * - GET /me (認証済み主体の確認用)
 * - AuthCtx を extractor で受け、Principal を DTO に詰め替えて返す
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(ctx.principal))
}
