use std::sync::Arc;

use hiro::{app, config::AppConfig, db, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("hiro=debug,axum=info,tower_http=info");

    let config = Arc::new(AppConfig::from_env()?);
    if config.allow_admin_signup {
        tracing::warn!("ALLOW_ADMIN_SIGNUP is on: public registration may request the admin role");
    }

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    db::migrate(&pool).await?;

    let state = AppState::new(pool, config);
    app::serve(app::build_app(state)).await
}
