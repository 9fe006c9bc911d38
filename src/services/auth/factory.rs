/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::AuthService;

// Infallible: an HMAC key has no parse step that could fail. Config has
// already rejected a missing or blank secret at startup.
pub fn build_auth_service(config: &Config) -> Arc<AuthService> {
    Arc::new(AuthService::new(
        &config.jwt_secret,
        config.access_token_leeway_seconds,
    ))
}
