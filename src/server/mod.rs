//! HTTP surface for the policy layer

pub mod routes;
pub mod state;
pub mod types;

pub use routes::router;
pub use state::AppState;

use crate::errors::Result;
use std::future::Future;
use tokio::net::TcpListener;

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("TaskGuard listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("TaskGuard shutting down");
        })
        .await?;

    Ok(())
}
