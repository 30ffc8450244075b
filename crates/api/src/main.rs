use anyhow::Context;

use storefront_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    storefront_observability::init(config.log_format);

    if config.insecure_jwt_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let storage = storefront_api::app::services::connect_storage(config.database_url.as_deref())
        .await
        .context("failed to open storage")?;

    let app = storefront_api::app::build_app(config.jwt_secret, storage);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
