//! Unix socket HTTP server for `/health`, `/fetch` and `/shutdown`.

use super::protocol::{self, FetchRequest, FetchResponse, ProtocolError, Route};
use super::session::FetchSession;
use super::DaemonError;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tokio::task::JoinSet;

/// How long a client may take to send its request headers.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DaemonServer {
    listener: UnixListener,
    socket_path: PathBuf,
    session: Arc<FetchSession>,
    shutdown: Arc<Notify>,
}

impl DaemonServer {
    /// Binds `socket_path`, replacing a stale socket file.
    ///
    /// Fails with [`DaemonError::AlreadyRunning`] if another daemon answers on it.
    pub async fn bind(socket_path: &Path, session: FetchSession) -> Result<Self, DaemonError> {
        if let Some(parent) = socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::symlink_metadata(socket_path).await.is_ok() {
            if UnixStream::connect(socket_path).await.is_ok() {
                return Err(DaemonError::AlreadyRunning(socket_path.to_path_buf()));
            }
            tracing::info!(path = %socket_path.display(), "Removing stale socket");
            tokio::fs::remove_file(socket_path).await?;
        }

        let listener = UnixListener::bind(socket_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = tokio::fs::set_permissions(socket_path, perms).await {
                tracing::warn!(error = %e, "Failed to restrict socket permissions");
            }
        }

        tracing::info!(path = %socket_path.display(), "Fetch daemon listening");
        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            session: Arc::new(session),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Handle that stops the server when notified, e.g. from a signal handler.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until shutdown is requested.
    ///
    /// In-flight requests finish before the session closes and the socket
    /// file is removed.
    pub async fn run(self) -> Result<(), DaemonError> {
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    tracing::info!("Shutdown requested");
                    break;
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            connections.spawn(serve_connection(
                                stream,
                                Arc::clone(&self.session),
                                Arc::clone(&self.shutdown),
                            ));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                        }
                    }
                }

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Connection task panicked");
                    }
                }
            }
        }

        drop(self.listener);
        while connections.join_next().await.is_some() {}
        self.session.close().await;

        if let Err(e) = tokio::fs::remove_file(&self.socket_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "Failed to remove socket file");
            }
        }
        tracing::info!("Fetch daemon stopped");
        Ok(())
    }
}

/// Serves one HTTP exchange, then closes the connection.
async fn serve_connection(stream: UnixStream, session: Arc<FetchSession>, shutdown: Arc<Notify>) {
    let service = service_fn(move |request: Request<Incoming>| {
        let session = Arc::clone(&session);
        let shutdown = Arc::clone(&shutdown);
        async move { Ok::<_, Infallible>(respond(request, &session, &shutdown).await) }
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(READ_TIMEOUT)
        .keep_alive(false);
    if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
        tracing::debug!(error = %e, "Connection ended with error");
    }
}

async fn respond(
    request: Request<Incoming>,
    session: &FetchSession,
    shutdown: &Notify,
) -> Response<Full<Bytes>> {
    let route = match Route::resolve(request.method(), request.uri().path()) {
        Ok(route) => route,
        Err(status) => {
            tracing::debug!(method = %request.method(), path = %request.uri().path(), %status, "Rejected request");
            return protocol::empty(status);
        }
    };

    match route {
        Route::Health => protocol::empty(StatusCode::OK),
        Route::Shutdown => {
            // The accept loop stops; this reply and in-flight fetches still finish.
            shutdown.notify_one();
            protocol::empty(StatusCode::OK)
        }
        Route::Fetch => {
            let req = match fetch_request(request.into_body()).await {
                Ok(req) => req,
                Err(e) => {
                    tracing::debug!(error = %e, "Invalid fetch body");
                    return protocol::empty(StatusCode::BAD_REQUEST);
                }
            };
            tracing::debug!(url = %req.url, debug = req.debug, "Fetch request");
            let result = session.fetch(&req.url, req.debug).await;
            protocol::json(&FetchResponse::from_result(result)).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Cannot encode fetch reply");
                protocol::empty(StatusCode::INTERNAL_SERVER_ERROR)
            })
        }
    }
}

async fn fetch_request(body: Incoming) -> Result<FetchRequest, ProtocolError> {
    let bytes = protocol::read_body(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
