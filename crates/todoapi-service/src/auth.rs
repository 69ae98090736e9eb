//! `/api/v1/auth` handlers and the cookie-based guards.

use axum::extract::{FromRequestParts, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::response::{AppendHeaders, IntoResponse};
use tracing::info;

use todoapi_lib::User;
use todoapi_service_shared::cookie::{
    authentication_cookie, clear_cookies, cookie_value, refresh_cookie, AUTHENTICATION_COOKIE,
    REFRESH_COOKIE,
};
use todoapi_service_shared::{
    record_login, ApiError, ApiResult, AppState, JsonApi, LoginDto, ValidJson,
};

use crate::presenter::IsAuthPresenter;

/// User resolved from a valid `Authentication` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = cookie_value(&parts.headers, AUTHENTICATION_COOKIE)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        let login = state.login().clone();
        let user =
            tokio::task::spawn_blocking(move || login.authenticate_access_token(&token)).await??;
        Ok(Self(user))
    }
}

/// User resolved from a `Refresh` cookie matching the last issued refresh token.
#[derive(Debug, Clone)]
pub struct RefreshUser(pub User);

impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = cookie_value(&parts.headers, REFRESH_COOKIE)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
        let login = state.login().clone();
        let user =
            tokio::task::spawn_blocking(move || login.authenticate_refresh_token(&token)).await??;
        Ok(Self(user))
    }
}

/// POST /api/v1/auth/login
///
/// Sets both session cookies and answers `201 "Login successful"`.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(dto): ValidJson<LoginDto>,
) -> Result<impl IntoResponse, ApiError> {
    let login = state.login().clone();
    let issued = tokio::task::spawn_blocking(move || {
        let profile = login.login(&dto.username, &dto.password)?;
        let access = login.get_jwt_token(&profile.username)?;
        let refresh = login.get_jwt_refresh_token(&profile.username)?;
        Ok::<_, todoapi_lib::Error>((profile, access, refresh))
    })
    .await?;

    let (profile, access, refresh) = match issued {
        Ok(tokens) => tokens,
        Err(e) => {
            record_login("failure");
            return Err(e.into());
        }
    };
    record_login("success");
    info!(username = %profile.username, "user logged in");

    Ok((
        AppendHeaders([
            (SET_COOKIE, authentication_cookie(&access.token, access.expires_in)),
            (SET_COOKIE, refresh_cookie(&refresh.token, refresh.expires_in)),
        ]),
        JsonApi::message("Login successful").created(),
    ))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let logout = state.logout().clone();
    tokio::task::spawn_blocking(move || logout.execute(&user.username)).await??;

    let [access, refresh] = clear_cookies();
    Ok((
        AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)]),
        JsonApi::message("Logout successful").created(),
    ))
}

/// GET /api/v1/auth/is_authenticated
pub async fn is_authenticated(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult {
    let usecase = state.is_authenticated().clone();
    let profile = tokio::task::spawn_blocking(move || usecase.execute(&user.username)).await??;
    Ok(JsonApi::resource(&IsAuthPresenter::from(profile)))
}

/// GET /api/v1/auth/refresh
///
/// Issues a new access cookie; the refresh token stays valid.
pub async fn refresh(
    State(state): State<AppState>,
    RefreshUser(user): RefreshUser,
) -> Result<impl IntoResponse, ApiError> {
    let login = state.login().clone();
    let access = tokio::task::spawn_blocking(move || login.get_jwt_token(&user.username)).await??;

    Ok((
        AppendHeaders([(
            SET_COOKIE,
            authentication_cookie(&access.token, access.expires_in),
        )]),
        JsonApi::message("Refresh successful"),
    ))
}
