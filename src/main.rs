//! Luxe Storefront - cart and catalog service

use anyhow::Result;
use luxe_storefront::config::StorefrontConfig;
use luxe_storefront::http::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = StorefrontConfig::from_env()?;
    let state = AppState::from_config(&config)?;
    let app = router(state);

    let addr = config.socket_addr();
    tracing::info!(%addr, data_dir = %config.data_dir.display(), slot = %config.cart_slot, "luxe storefront listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
