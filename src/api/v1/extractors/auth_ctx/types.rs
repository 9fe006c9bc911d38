/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークンの検証ロジックは middleware/services 側の責務
 * - テナント越えの防止など認可チェックは handler / service 側で行う
 */

use crate::services::auth::Principal;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `principal` は検証済みトークン由来の認証主体 (user / company)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: Principal,
}

impl AuthCtx {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }
}
