use auth_service::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "auth_service=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env()?;
    let resources = AppState::init(&config).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&resources.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let app = app::build_app(resources.state, config.request_timeout);
    app::serve(app).await
}
