//! Admin HTTP server.

use anyhow::Result;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, instrument};

/// Serve `app` on `addr` until `shutdown` resolves.
///
/// Callers usually pass [`crate::admin_router`] wrapped in their own layers.
#[instrument(skip(app, shutdown))]
pub async fn start_server<F>(addr: SocketAddr, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&addr).await?;
    info!("[AdminApi] Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    info!("[AdminApi] Server stopped");
    Ok(())
}
