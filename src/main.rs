mod app;
mod auth;
mod comments;
mod config;
mod dilemmas;
mod error;
mod state;
mod votes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "dilemmahub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Missing DATABASE_URL or JWT_SECRET aborts here; the server never runs
    // with a guessable default secret.
    let app_state = match state::AppState::init().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "startup configuration failed");
            return Err(e);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
