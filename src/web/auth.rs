use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{Form, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration as CookieDuration;
use serde::Deserialize;

use crate::{
    error::LibraryError,
    session::Viewer,
    web::{
        AppState,
        responses::{ForViewer, PageError, public_message},
        templates::render_login_page,
    },
};

pub const SESSION_COOKIE: &str = "session";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Resolves the `session` cookie once per request. Unknown or missing tokens
/// yield an anonymous viewer rather than a rejection.
#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value());
        Ok(state.sessions().resolve(token).await)
    }
}

pub async fn login_page(viewer: Viewer) -> Result<Html<String>, Redirect> {
    if viewer.is_admin {
        return Err(Redirect::to("/library"));
    }

    Ok(Html(render_login_page(None)))
}

pub async fn process_login(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Response> {
    if viewer.is_admin {
        return Ok((jar, Redirect::to("/library")));
    }

    let session = match state
        .sessions()
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok(session) => session,
        Err(err @ LibraryError::AuthFailed) => {
            let page = render_login_page(Some(&public_message(&err)));
            return Err((StatusCode::UNAUTHORIZED, Html(page)).into_response());
        }
        Err(err) => return Err(err.into_response()),
    };

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);

    Ok((jar.add(cookie), Redirect::to("/library")))
}

/// Revokes the session before clearing the cookie. If revocation fails the
/// cookie is kept and the caller sees the error page.
pub async fn logout(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), PageError> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    state
        .sessions()
        .logout(token.as_deref())
        .await
        .for_viewer(&viewer)?;

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));

    Ok((jar.remove(removal), Redirect::to("/library")))
}
