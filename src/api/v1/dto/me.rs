/*
 * Responsibility
 * - /me の response DTO
 * - ダッシュボード向けに camelCase で返す
 */
use serde::Serialize;

use crate::services::auth::Principal;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: i64,
    pub email: String,
    pub company_id: i64,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id,
            email: principal.email,
            company_id: principal.company_id,
        }
    }
}
