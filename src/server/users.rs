//! Account, session and channel-profile handlers.

use super::session::{Session, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::state::ServerState;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::auth::{TokenKind, TokenPair};
use crate::enrichment::models::{ChannelProfile, VideoView};
use crate::store::models::{AuthProvider, NewUser, UserRecord};
use crate::store::{HistoryStore, UserStore};
use crate::{auth, media::MediaStore};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-username", patch(update_username))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover))
        .route("/c/{username}", get(channel_profile))
        .route("/history", get(watch_history))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    user: UserRecord,
    access_token: String,
    refresh_token: String,
}

fn auth_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn with_auth_cookies(jar: CookieJar, state: &ServerState, pair: &TokenPair) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        state.tokens.access_ttl_secs(),
    ))
    .add(auth_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        state.tokens.refresh_ttl_secs(),
    ))
}

fn without_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_TOKEN_COOKIE, "")).path("/").build())
}

/// Issues a fresh token pair and persists the refresh half as the
/// user's single active refresh credential.
fn issue_session(state: &ServerState, user: &UserRecord) -> Result<TokenPair, ApiError> {
    let pair = state
        .tokens
        .issue_pair(user.id)
        .map_err(|e| ApiError::Internal(e.into()))?;
    state
        .store
        .set_refresh_token(user.id, Some(&pair.refresh_token))?;
    Ok(pair)
}

#[derive(Default)]
struct RegisterForm {
    full_name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    auth_provider: Option<String>,
    provider_subject: Option<String>,
    avatar_url: Option<String>,
    email_verified: bool,
    avatar: Option<(String, Vec<u8>)>,
    cover_image: Option<(String, Vec<u8>)>,
}

async fn collect_register_form(mut multipart: Multipart) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "avatar" | "coverImage" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
                    .to_vec();
                if name == "avatar" {
                    form.avatar = Some((file_name, bytes));
                } else {
                    form.cover_image = Some((file_name, bytes));
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidArgument(e.to_string()))?;
                match name.as_str() {
                    "fullName" => form.full_name = Some(value),
                    "username" => form.username = Some(value),
                    "email" => form.email = Some(value),
                    "password" => form.password = Some(value),
                    "authType" => form.auth_provider = Some(value),
                    "providerSubject" => form.provider_subject = Some(value),
                    "avatarUrl" => form.avatar_url = Some(value),
                    "emailVerified" => form.email_verified = value == "true",
                    _ => {}
                }
            }
        }
    }
    Ok(form)
}

async fn register(
    State(state): State<ServerState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<(CookieJar, ApiResponse<AuthPayload>), ApiError> {
    let form = collect_register_form(multipart).await?;

    let (Some(full_name), Some(mut username), Some(email)) = (
        form.full_name.filter(|s| !s.trim().is_empty()),
        form.username.filter(|s| !s.trim().is_empty()),
        form.email.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::InvalidArgument(
            "All fields are required".to_string(),
        ));
    };

    let provider = match form.auth_provider.as_deref() {
        None | Some("local") => AuthProvider::Local,
        Some("google") => AuthProvider::Google,
        Some(other) => {
            return Err(ApiError::InvalidArgument(format!(
                "Unknown auth type {}",
                other
            )))
        }
    };
    if provider == AuthProvider::Google && !form.email_verified {
        return Err(ApiError::InvalidArgument(
            "Email is not verified by the provider".to_string(),
        ));
    }

    if state.store.user_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict(
            "User with given email already exists".to_string(),
        ));
    }
    // Federated signups pick their own handle, so collisions get a
    // numeric suffix instead of an error.
    if provider == AuthProvider::Google {
        let taken = state.store.count_username(&username)?;
        if taken > 0 {
            username = format!("{}{}", username, taken);
        }
    }
    if state.store.user_by_username(&username)?.is_some() {
        return Err(ApiError::Conflict(
            "User with given username already exists".to_string(),
        ));
    }

    if form.avatar.is_none() && form.avatar_url.is_none() {
        return Err(ApiError::InvalidArgument("Avatar is required".to_string()));
    }

    let mut avatar_url = form.avatar_url;
    let mut avatar_asset_id = None;
    if let Some((file_name, bytes)) = form.avatar {
        let asset = state
            .media
            .upload(&file_name, bytes)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        avatar_url = Some(asset.url);
        avatar_asset_id = Some(asset.asset_id);
    }
    let mut cover_url = None;
    let mut cover_asset_id = None;
    if let Some((file_name, bytes)) = form.cover_image {
        match state.media.upload(&file_name, bytes).await {
            Ok(asset) => {
                cover_url = Some(asset.url);
                cover_asset_id = Some(asset.asset_id);
            }
            Err(e) => {
                // Abort entirely; the avatar asset is already orphaned
                // at the media host, release it if we can.
                if let Some(asset_id) = &avatar_asset_id {
                    state.media.delete_best_effort(asset_id).await;
                }
                return Err(ApiError::Internal(e.into()));
            }
        }
    }

    let password_hash = match &form.password {
        Some(plain) => Some(auth::password::hash(plain)?),
        None => None,
    };

    let user = state.store.create_user(NewUser {
        username: username.to_lowercase(),
        email,
        full_name,
        password_hash,
        auth_provider: provider,
        provider_subject: form.provider_subject,
        avatar_url,
        avatar_asset_id,
        cover_url,
        cover_asset_id,
    })?;

    let pair = issue_session(&state, &user)?;
    let jar = with_auth_cookies(jar, &state, &pair);
    Ok((
        jar,
        ApiResponse::created(
            AuthPayload {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User registered successfully",
        ),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    auth_type: Option<String>,
    provider_subject: Option<String>,
}

async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, ApiResponse<AuthPayload>), ApiError> {
    if body.username.is_none() && body.email.is_none() {
        return Err(ApiError::InvalidArgument(
            "username or email is required".to_string(),
        ));
    }

    let user = if body.auth_type.as_deref() == Some("google") {
        let (Some(subject), Some(email)) = (&body.provider_subject, &body.email) else {
            return Err(ApiError::InvalidArgument(
                "providerSubject and email are required".to_string(),
            ));
        };
        state.store.user_by_provider(subject, email)?
    } else {
        match (&body.username, &body.email) {
            (Some(username), _) => state.store.user_by_username(username)?,
            (None, Some(email)) => state.store.user_by_email(email)?,
            (None, None) => unreachable!(),
        }
    };
    let Some(user) = user else {
        return Err(ApiError::NotFound("User does not exist".to_string()));
    };

    if user.auth_provider == AuthProvider::Local {
        let valid = match (&body.password, &user.password_hash) {
            (Some(plain), Some(hash)) => auth::password::verify(plain, hash)?,
            _ => false,
        };
        if !valid {
            return Err(ApiError::Unauthorized(
                "Invalid user credentials".to_string(),
            ));
        }
    }

    let pair = issue_session(&state, &user)?;
    let jar = with_auth_cookies(jar, &state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            AuthPayload {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

async fn logout(
    State(state): State<ServerState>,
    session: Session,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Option<()>>), ApiError> {
    state.store.set_refresh_token(session.user_id, None)?;
    Ok((
        without_auth_cookies(jar),
        ApiResponse::ok(None, "User logged out successfully"),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: Option<String>,
}

async fn refresh_token(
    State(state): State<ServerState>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>), ApiError> {
    // The refresh credential arrives in the cookie or, failing that, in
    // an optional JSON body.
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            serde_json::from_slice::<RefreshBody>(&body)
                .ok()
                .and_then(|b| b.refresh_token)
        });
    let Some(presented) = presented else {
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    };

    let user_id = state
        .tokens
        .verify(&presented, TokenKind::Refresh)
        .map_err(|_| ApiError::Unauthorized("Unauthorized request".to_string()))?;
    let Some(user) = state.store.user_by_id(user_id)? else {
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    };
    // Rotation: only the single stored refresh credential is accepted.
    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or invalid".to_string(),
        ));
    }

    let pair = issue_session(&state, &user)?;
    let jar = with_auth_cookies(jar, &state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            json!({
                "accessToken": pair.access_token,
                "refreshToken": pair.refresh_token,
            }),
            "Access token refreshed",
        ),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody {
    old_password: Option<String>,
    new_password: String,
}

async fn change_password(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<ChangePasswordBody>,
) -> ApiResult<Option<()>> {
    let Some(user) = state.store.user_by_id(session.user_id)? else {
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    };

    if user.auth_provider == AuthProvider::Local {
        let valid = match (&body.old_password, &user.password_hash) {
            (Some(plain), Some(hash)) => auth::password::verify(plain, hash)?,
            _ => false,
        };
        if !valid {
            return Err(ApiError::InvalidArgument("Invalid old password".to_string()));
        }
    }

    let hash = auth::password::hash(&body.new_password)?;
    state.store.set_password_hash(user.id, &hash)?;
    Ok(ApiResponse::ok(None, "Password changed successfully"))
}

async fn current_user(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<serde_json::Value> {
    let Some(user) = state.store.user_by_id(session.user_id)? else {
        return Err(ApiError::Unauthorized("Unauthorized request".to_string()));
    };
    Ok(ApiResponse::ok(
        json!({ "user": user }),
        "Current user fetched successfully",
    ))
}

#[derive(Deserialize)]
struct UpdateUsernameBody {
    username: String,
}

async fn update_username(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<UpdateUsernameBody>,
) -> ApiResult<UserRecord> {
    let username = body.username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::InvalidArgument("username is required".to_string()));
    }
    if let Some(existing) = state.store.user_by_username(&username)? {
        if existing.id != session.user_id {
            return Err(ApiError::Conflict("username already exists".to_string()));
        }
    }
    let Some(user) = state.store.set_username(session.user_id, &username)? else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };
    Ok(ApiResponse::ok(user, "Username updated successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountBody {
    full_name: Option<String>,
    email: Option<String>,
}

async fn update_account(
    State(state): State<ServerState>,
    session: Session,
    Json(body): Json<UpdateAccountBody>,
) -> ApiResult<UserRecord> {
    let (Some(full_name), Some(email)) = (
        body.full_name.filter(|s| !s.trim().is_empty()),
        body.email.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::InvalidArgument(
            "All fields are required".to_string(),
        ));
    };
    let Some(user) = state
        .store
        .set_account_details(session.user_id, &full_name, &email)?
    else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };
    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

async fn single_file(multipart: &mut Multipart, expected: &str) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
    {
        if field.name() == Some(expected) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidArgument(e.to_string()))?
                .to_vec();
            return Ok((file_name, bytes));
        }
    }
    Err(ApiError::InvalidArgument(format!(
        "{} file is missing",
        expected
    )))
}

async fn update_avatar(
    State(state): State<ServerState>,
    session: Session,
    mut multipart: Multipart,
) -> ApiResult<UserRecord> {
    let (file_name, bytes) = single_file(&mut multipart, "avatar").await?;
    let previous = state
        .store
        .user_by_id(session.user_id)?
        .and_then(|u| u.avatar_asset_id);

    let asset = state
        .media
        .upload(&file_name, bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    let Some(user) = state
        .store
        .set_avatar(session.user_id, &asset.url, &asset.asset_id)?
    else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };
    if let Some(old) = previous {
        state.media.delete_best_effort(&old).await;
    }
    Ok(ApiResponse::ok(user, "User avatar updated successfully"))
}

async fn update_cover(
    State(state): State<ServerState>,
    session: Session,
    mut multipart: Multipart,
) -> ApiResult<UserRecord> {
    let (file_name, bytes) = single_file(&mut multipart, "coverImage").await?;
    let previous = state
        .store
        .user_by_id(session.user_id)?
        .and_then(|u| u.cover_asset_id);

    let asset = state
        .media
        .upload(&file_name, bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    let Some(user) = state
        .store
        .set_cover(session.user_id, &asset.url, &asset.asset_id)?
    else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };
    if let Some(old) = previous {
        state.media.delete_best_effort(&old).await;
    }
    Ok(ApiResponse::ok(user, "User cover image updated successfully"))
}

async fn channel_profile(
    State(state): State<ServerState>,
    session: Option<Session>,
    Path(username): Path<String>,
) -> ApiResult<ChannelProfile> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::InvalidArgument("username is missing".to_string()));
    }
    let viewer = session.map(|s| s.user_id);
    let Some(profile) = state.store.channel_profile(&username, viewer)? else {
        return Err(ApiError::NotFound("channel does not exist".to_string()));
    };
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

async fn watch_history(
    State(state): State<ServerState>,
    session: Session,
) -> ApiResult<Vec<VideoView>> {
    let history = state.store.watch_history(session.user_id)?;
    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}
