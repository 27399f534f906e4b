// HTTP surface
//
// - router: route table, CORS and request tracing
// - handlers: one module per resource
// - error: `SubfluxError` to status code mapping
// - state: shared `AppState`

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;

use tokio::net::TcpListener;
use tracing::info;

use crate::context::AppContext;
use crate::error::Result;

/// Bind the configured address and serve until the process stops
pub async fn serve(context: AppContext) -> Result<()> {
    let address = format!("{}:{}", context.config.server.host, context.config.server.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Subflux listening on http://{}", address);

    let router = create_router(AppState::new(context));
    axum::serve(listener, router).await?;
    Ok(())
}
