use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::web::{
    AppState, render_login_page,
    session::{self, Session},
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Rejection for JSON endpoints that require a signed-in session.
pub struct JsonAuthError {
    pub status: StatusCode,
    pub message: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), Redirect> {
    let (jar, session) = session::resolve_or_start(state.sessions(), jar).await;
    if session.authenticated {
        return Err(Redirect::to("/"));
    }

    Ok((jar, Html(render_login_page(None))))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, CookieJar, Html<String>)> {
    let (jar, session) = session::resolve_or_start(state.sessions(), jar).await;

    if !state.credentials().verify(&form.username, &form.password) {
        warn!(username = %form.username, "rejected login attempt");
        return Err((
            StatusCode::UNAUTHORIZED,
            jar,
            Html(render_login_page(Some(INVALID_CREDENTIALS))),
        ));
    }

    let jar = session::sign_in(state.sessions(), jar, session.token, &form.username).await;
    info!(
        username = %form.username,
        session_started = %session.created_at,
        "user logged in"
    );

    Ok((jar, Redirect::to("/?status=logged_in")))
}

/// Returns the current session if it has passed authentication.
pub async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let token = session::session_token(jar)?;
    state
        .sessions()
        .touch(token)
        .await
        .filter(|session| session.authenticated)
}

pub async fn current_user_or_json_error(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Session, JsonAuthError> {
    current_session(state, jar).await.ok_or(JsonAuthError {
        status: StatusCode::UNAUTHORIZED,
        message: "Please log in before uploading a document.".to_string(),
    })
}
