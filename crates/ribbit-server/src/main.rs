mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ribbit_api::auth::{AppStateInner, JwtSettings, hash_password};
use ribbit_api::routes::router;
use ribbit_db::models::{NewUser, SUPER_ADMIN_ROLE_ID};
use ribbit_db::{Database, DbError};

use crate::config::{AdminSeed, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ribbit=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    if let Some(seed) = &config.admin {
        provision_admin(&db, seed)?;
    }

    let state = AppStateInner::new(
        db,
        JwtSettings {
            secret: config.jwt_secret.clone(),
            ttl_minutes: config.jwt_ttl_minutes,
        },
    );

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Ribbit server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn provision_admin(db: &Database, seed: &AdminSeed) -> anyhow::Result<()> {
    match db.get_user_by_username(&seed.username) {
        Ok(_) => return Ok(()),
        Err(DbError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let password = hash_password(&seed.password)
        .map_err(|e| anyhow::anyhow!("hashing admin password: {e}"))?;
    match db.create_user(&NewUser {
        username: seed.username.clone(),
        email: seed.email.clone(),
        password,
        role_id: SUPER_ADMIN_ROLE_ID,
        first_name: None,
        last_name: None,
        referral_code: None,
        country_code: None,
        mobile: None,
    }) {
        Ok(user) => info!(user_id = user.id, "provisioned super admin {}", seed.username),
        Err(DbError::AlreadyExists(msg)) => warn!("admin not provisioned: {}", msg),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
