//! HTTP server lifecycle.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::controller::{AppState, create_router};

/// Query surface HTTP server bound to its listening socket.
pub struct HttpServer {
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Bind the listening socket on all interfaces.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::BindFailed` if the port cannot be bound.
    pub async fn bind(
        port: u16,
        state: AppState,
        cancel: CancellationToken,
    ) -> Result<Self, HttpServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(port, e.to_string()))?;

        Ok(Self {
            listener,
            state,
            cancel,
        })
    }

    /// Address the server is listening on.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::ServerFailed` if the socket address cannot
    /// be read.
    pub fn local_addr(&self) -> Result<SocketAddr, HttpServerError> {
        self.listener
            .local_addr()
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))
    }

    /// Serve requests until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if the HTTP server encounters a fatal error
    /// while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let app = create_router(self.state);

        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(port = addr.port(), "HTTP server listening");
        }

        axum::serve(self.listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
