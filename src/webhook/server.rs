//! Webhook HTTP endpoint.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::commands::UpdateRouter;
use crate::store::StoreError;
use crate::telegram::decode_update;

/// Builds the axum app that serves `path`.
pub fn app(router: Arc<UpdateRouter>, path: &str) -> Router {
    Router::new()
        .route(path, any(handle_webhook))
        .with_state(router)
}

/// Serves the app until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Webhook server listening on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handles one webhook request.
///
/// - non-POST: `200 OK`, nothing processed
/// - undecodable body: `400`
/// - corrupt state file: `200`, logged; redelivery would fail the same way
/// - other store failure: `500`, so the platform delivers the update again
pub async fn handle_webhook(
    State(router): State<Arc<UpdateRouter>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        debug!("Ignoring {} request", method);
        return (StatusCode::OK, "OK").into_response();
    }

    let update = match decode_update(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejecting undecodable update ({} bytes): {}", body.len(), e);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    match router.handle_update(&update).await {
        Ok(outcome) => {
            debug!("Update {} handled: {:?}", update.id.0, outcome);
            (StatusCode::OK, "OK").into_response()
        }
        Err(e @ StoreError::Corrupt { .. }) => {
            error!(
                "Dropping update {}: {}. Repair or remove the file to resume.",
                update.id.0, e
            );
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => {
            error!("Failed to handle update {}: {}", update.id.0, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
