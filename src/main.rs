use anyhow::Context;
use camera_angle_studio::{router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env().context("reading configuration")?;
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating {}", config.upload_dir.display()))?;

    if config.fal_key.is_none() {
        tracing::warn!("FAL_KEY not set, fal presets will fail");
    }
    if config.google_api_key.is_none() && !config.gemini_simulate {
        tracing::warn!("GOOGLE_API_KEY not set, Gemini presets will fail");
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config).context("building HTTP client")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    tracing::info!("🚀 Server running on http://{}", bind_addr);
    tracing::info!("🎥 Open in your browser to start re-shooting!");

    axum::serve(listener, app).await?;
    Ok(())
}
