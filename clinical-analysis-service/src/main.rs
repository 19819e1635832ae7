use clinical_analysis_service::{ServiceConfig, create_app};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServiceConfig::from_env()?;
    let app = create_app(&config)?;

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Clinical Analysis Service starting on {}", addr);
    info!(model = %config.model, "Reasoning model configured");
    info!("Health check endpoint: http://{}/health", addr);
    info!("Analysis endpoint: POST http://{}/clinical/analyze", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
