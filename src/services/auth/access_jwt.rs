//! Bearer アクセストークン（JWT）の検証 → Principal の取り出し
//!
//! リクエストの header map を入力に、検証済みの認証主体か分類済みの失敗を返す。
//! 判定はこのモジュールで完結し、HTTP status への変換は `error.rs` 側で行う。

use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

/// Scheme prefix expected in the `Authorization` header.
/// The comparison is case-sensitive and includes the trailing space.
const BEARER_PREFIX: &str = "Bearer ";

// Errors returned by request authentication. The first three are caused by
// the client (the caller maps them to 401); `Verification` means the check
// itself could not be carried out (500).
#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    MissingToken,
    InvalidToken(jsonwebtoken::errors::Error),
    Verification(jsonwebtoken::errors::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => {
                write!(f, "authorization header missing or not a bearer scheme")
            }
            Self::MissingToken => write!(f, "bearer token is empty"),
            Self::InvalidToken(e) => write!(f, "token rejected: {}", e),
            Self::Verification(e) => write!(f, "token verification unavailable: {}", e),
        }
    }
}

impl StdError for AuthError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidToken(e) | Self::Verification(e) => Some(e),
            _ => None,
        }
    }
}

/// Access token claims as they appear on the wire.
///
/// NOTE:
/// - The payload uses custom camelCase claims; `sub` is not part of this
///   token format.
/// - `exp`/`iat` are optional. Expiry is enforced only when the token
///   carries it.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    #[serde(rename = "companyId")]
    pub company_id: i64,

    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// 検証済みトークンから取り出した認証主体
///
/// - 署名検証と exp チェックを通過したトークンからのみ構築される
/// - リクエスト毎に構築し、キャッシュや永続化はしない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub company_id: i64,
}

impl From<AccessTokenClaims> for Principal {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            company_id: claims.company_id,
        }
    }
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        // `exp` is validated when present; a token without it is accepted,
        // so no registered claim is hard-required.
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            decoding_key,
            validation,
        }
    }

    /// Authenticate an inbound request from its header map.
    ///
    /// Pure given (headers, configured secret, clock): no I/O, no logging,
    /// no state mutation. Every failure is terminal for the call; nothing
    /// is retried here.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers)?;
        self.verify(token)
    }

    /// Verify a bearer token and decode its claims into a `Principal`.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
                .map_err(classify)?;

        Ok(Principal::from(data.claims))
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// - ヘッダ欠落 / `Bearer ` 以外のスキーム → `MissingHeader`
/// - スキームのみでトークンが空 → `MissingToken`
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingHeader)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

// Split verification failures into what the client sent wrong (signature,
// structure, expiry, claim shape) and what the server could not check.
fn classify(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::InvalidToken(e),
        _ => AuthError::Verification(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "unit-test-verification-secret";

    fn service() -> AuthService {
        // Zero leeway keeps the expiry tests deterministic.
        AuthService::new(SECRET, 0)
    }

    fn sign(secret: &str, claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token signing in tests")
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "userId": 1,
            "email": "a@b.com",
            "companyId": 2,
            "iat": Utc::now().timestamp(),
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let outcome = service().authenticate(&HeaderMap::new());
        assert!(matches!(outcome, Err(AuthError::MissingHeader)));
    }

    #[test]
    fn non_bearer_scheme_is_rejected_as_missing_header() {
        // Includes lowercase scheme and a prefix without the trailing space.
        for value in ["Basic dXNlcjpwdw==", "bearer abc", "Bearer", "Token abc"] {
            let outcome = service().authenticate(&headers_with(value));
            assert!(
                matches!(outcome, Err(AuthError::MissingHeader)),
                "value: {value}"
            );
        }
    }

    #[test]
    fn empty_token_is_rejected_as_missing_token() {
        let outcome = service().authenticate(&headers_with("Bearer "));
        assert!(matches!(outcome, Err(AuthError::MissingToken)));
    }

    #[test]
    fn valid_token_yields_principal() {
        let token = sign(SECRET, &valid_claims());
        let principal = service()
            .authenticate(&headers_with(&format!("Bearer {token}")))
            .expect("valid token");

        assert_eq!(
            principal,
            Principal {
                user_id: 1,
                email: "a@b.com".to_string(),
                company_id: 2,
            }
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = sign("some-other-secret", &valid_claims());
        let outcome = service().verify(&token);
        assert!(matches!(outcome, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_invalid() {
        let mut claims = valid_claims();
        claims["exp"] = json!((Utc::now() - Duration::hours(1)).timestamp());
        let token = sign(SECRET, &claims);

        let outcome = service().verify(&token);
        assert!(matches!(outcome, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn token_without_exp_is_accepted() {
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("exp");
        let token = sign(SECRET, &claims);

        assert!(service().verify(&token).is_ok());
    }

    #[test]
    fn token_with_missing_claim_is_invalid() {
        let mut claims = valid_claims();
        claims.as_object_mut().unwrap().remove("companyId");
        let token = sign(SECRET, &claims);

        let outcome = service().verify(&token);
        assert!(matches!(outcome, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let outcome = service().authenticate(&headers_with("Bearer not-a-jwt"));
        assert!(matches!(outcome, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn authentication_is_idempotent() {
        let auth = service();
        let headers = headers_with(&format!("Bearer {}", sign(SECRET, &valid_claims())));

        let first = auth.authenticate(&headers).expect("first call");
        let second = auth.authenticate(&headers).expect("second call");
        assert_eq!(first, second);
    }
}
