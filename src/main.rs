mod config;
pub mod llm;
mod maintenance;
mod modules;
mod pipeline;
mod report;
mod rouge;
mod summarize;
mod text;
mod web;

pub use web::{AppState, escape_html, render_footer};

use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        if let Err(err) = print_password_hash(args.next()) {
            error!(?err, "failed to hash password");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let port = config.port;
    let state = AppState::new(config)?;

    maintenance::spawn(state.sessions().clone());

    let app = web::router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Prints an Argon2 hash suitable for an `AUTH_USERS_FILE` entry.
fn print_password_hash(password: Option<String>) -> Result<()> {
    let password = password.context("usage: article-summarizer hash-password <password>")?;
    let hash = web::credentials::hash_password(&password)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;
    println!("{hash}");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
