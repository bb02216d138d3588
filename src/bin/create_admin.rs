//! Seeds an administrator account.
//!
//! Reads `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_PHONE` (required) and `ADMIN_NAME`
//! (default "Admin") from the environment. Exits successfully if the account already exists.

use anyhow::Context;
use hiro::{
    auth::{
        dto::RegisterRequest,
        repo::{PgUserRepo, UserRepo},
        services,
    },
    db, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("create_admin=info,hiro=info");

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let email = std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?;
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?;
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".into());
    let phone = std::env::var("ADMIN_PHONE").context("ADMIN_PHONE is not set")?;

    let pool = db::connect(&database_url, 1).await?;
    db::migrate(&pool).await?;
    let users = PgUserRepo::new(pool);

    if let Some(existing) = users.find_by_email(&services::normalize_email(&email)).await? {
        tracing::info!(email = %existing.email, role = existing.role.as_str(), "account already exists");
        return Ok(());
    }

    let admin = services::register(
        &users,
        RegisterRequest {
            name: Some(name),
            email: Some(email),
            password: Some(password),
            phone_number: Some(phone),
            role: Some("admin".into()),
        },
        true,
    )
    .await
    .context("create admin")?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "admin created");
    Ok(())
}
