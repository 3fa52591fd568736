//! Restaurant API server.
//!
//! Run from repo root: `cargo run -p restaurant-server`
//! Settings come from the environment or a `.env` file (see `Settings`).

use restaurant_api::{build_router, ensure_superuser, store, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("restaurant_api=info,tower_http=info")
            }),
        )
        .init();

    let settings = Settings::from_env()?;
    let store = store::connect(&settings).await?;
    if let Some(admin) = &settings.admin {
        ensure_superuser(store.as_ref(), admin).await?;
    }
    tracing::warn!("/tables/ accepts anonymous writes");

    let app = build_router(AppState::new(store), settings.body_limit);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
