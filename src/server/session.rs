//! Session extraction from the access-token cookie or bearer header.

use super::state::ServerState;
use crate::api::ApiError;
use crate::auth::TokenKind;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use uuid::Uuid;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// The authenticated caller. Handlers take `Session` to require a valid
/// access token, or `Option<Session>` where anonymous viewers are
/// allowed and enrichment flags simply resolve to false.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
}

fn token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
}

fn token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

fn session_from_parts(parts: &Parts, state: &ServerState) -> Option<Session> {
    let token = token_from_cookies(parts).or_else(|| token_from_headers(parts))?;
    let user_id = state.tokens.verify(&token, TokenKind::Access).ok()?;
    Some(Session { user_id })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(session_from_parts(parts, state))
    }
}
