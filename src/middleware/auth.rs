use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::api::common::ApiError;

pub const JWT_ALGORITHM: Algorithm = Algorithm::HS256;
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Staff roles. The wire value is the integer stored on the user row;
/// anything unknown is treated as an anonymous guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guest,
    SuperAdmin,
    Admin,
    Receptionist,
}

impl Role {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Role::SuperAdmin,
            2 => Role::Admin,
            3 => Role::Receptionist,
            _ => Role::Guest,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Role::Guest => 0,
            Role::SuperAdmin => 1,
            Role::Admin => 2,
            Role::Receptionist => 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String,
    pub role: i32,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated caller, attached to the request extensions by the auth
/// middleware.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: i64,
    pub role: Role,
}

fn jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| "bookstay_jwt_dev_secret".to_string())
}

/// Sign a token for a freshly authenticated user.
pub fn issue_token(user_id: i64, role: Role) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        role: role.as_i32(),
        exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn verify_token(token: &str) -> Result<JwtClaims, ApiError> {
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::new(JWT_ALGORITHM),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!("JWT validation failed: {}", e);
        ApiError::Unauthorized("invalid or expired token".to_string())
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("malformed Authorization header".to_string()))?;
    Ok(token)
}

fn current_user(claims: &JwtClaims) -> Result<CurrentUser, ApiError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthorized("invalid subject in token".to_string()))?;
    Ok(CurrentUser {
        user_id,
        role: Role::from_i32(claims.role),
    })
}

/// Resolve the caller from headers without rejecting anonymous requests.
/// Public endpoints use this so guests read the global cache scope.
pub fn user_from_headers(headers: &HeaderMap) -> CurrentUser {
    match bearer_token(headers).and_then(|token| {
        let claims = verify_token(token)?;
        current_user(&claims)
    }) {
        Ok(user) => user,
        Err(_) => CurrentUser {
            user_id: 0,
            role: Role::Guest,
        },
    }
}

/// Middleware for routes that require an authenticated staff member.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = verify_token(token)?;
    let user = current_user(&claims)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_wire_values() {
        for role in [Role::Guest, Role::SuperAdmin, Role::Admin, Role::Receptionist] {
            assert_eq!(Role::from_i32(role.as_i32()), role);
        }
        assert_eq!(Role::from_i32(42), Role::Guest);
    }

    #[test]
    fn issued_tokens_validate() {
        let token = issue_token(7, Role::Admin).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(Role::from_i32(claims.role), Role::Admin);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn anonymous_headers_resolve_to_guest() {
        let user = user_from_headers(&HeaderMap::new());
        assert_eq!(user.role, Role::Guest);
        assert_eq!(user.user_id, 0);
    }
}
