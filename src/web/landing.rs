use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    modules::summarizer,
    web::{AppState, render_login_page, session},
};

#[derive(Default, Deserialize)]
pub struct LandingQuery {
    pub status: Option<String>,
}

/// Entry point: starts a session when needed and shows either the login
/// form or the summarizer tool.
pub async fn landing_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<LandingQuery>,
) -> (CookieJar, Html<String>) {
    let (jar, session) = session::resolve_or_start(state.sessions(), jar).await;

    let page = if session.authenticated {
        summarizer::render_summarizer_page(&session, &compose_landing_flash(&params))
    } else {
        render_login_page(None)
    };

    (jar, Html(page))
}

fn compose_landing_flash(params: &LandingQuery) -> String {
    match params.status.as_deref() {
        Some("logged_in") => {
            r#"<div class="flash success">Logged in successfully!</div>"#.to_string()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_statuses_produce_a_banner() {
        let logged_in = LandingQuery {
            status: Some("logged_in".into()),
        };
        assert!(compose_landing_flash(&logged_in).contains("Logged in successfully!"));

        let other = LandingQuery {
            status: Some("<script>".into()),
        };
        assert!(compose_landing_flash(&other).is_empty());
        assert!(compose_landing_flash(&LandingQuery::default()).is_empty());
    }
}
