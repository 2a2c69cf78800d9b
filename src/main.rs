use anyhow::Context;
use sheet_mapper::config::Config;
use sheet_mapper::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing/logging
    tracing_subscriber::fmt::init();

    // Load configuration and environment variables to pass to the application
    let config: Config = Config::from_env();

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );
    tracing::info!("Schemes stored at {}", config.schemes_path.display());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let router = routes::build_router(&config);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
