mod configuration;
mod error;
mod routes;
mod sse;
mod state;

use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;
    info!(
        model = %settings.completion.model,
        tools = ?settings.tools,
        framing = ?settings.server.framing,
        "starting tickertalk"
    );

    let state = state::AppState::from_settings(settings)?;

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
