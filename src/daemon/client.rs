use super::protocol::{self, FetchRequest, FetchResponse, ProtocolError, Route, JSON_CONTENT_TYPE};
use super::DaemonError;
use crate::article::Article;
use crate::error::FetchError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{HeaderValue, CONTENT_TYPE, HOST};
use hyper::{Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::net::UnixStream;

/// Budget for `/health` and `/shutdown` round trips.
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(2);

/// Talks to a daemon over its socket. Cheap to clone; holds no connection.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// One HTTP exchange on a fresh connection. Returns the body of a `200`.
    async fn send(&self, route: Route, body: Bytes, timeout: Duration) -> Result<Bytes, DaemonError> {
        let exchange = async {
            let stream = UnixStream::connect(&self.socket_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound | ErrorKind::ConnectionRefused => DaemonError::NotRunning,
                    _ => DaemonError::Io(e),
                })?;
            let (mut sender, connection) = http1::handshake(TokioIo::new(stream))
                .await
                .map_err(ProtocolError::from)?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "Daemon connection ended with error");
                }
            });

            let response = sender
                .send_request(build_request(route, body))
                .await
                .map_err(ProtocolError::from)?;
            if response.status() != StatusCode::OK {
                return Err(DaemonError::Status(response.status().as_u16()));
            }
            Ok::<_, DaemonError>(protocol::read_body(response.into_body()).await?)
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| DaemonError::Timeout)?
    }

    /// Round-trip time of a `/health` call.
    pub async fn health(&self) -> Result<Duration, DaemonError> {
        let started = Instant::now();
        self.send(Route::Health, Bytes::new(), CONTROL_TIMEOUT).await?;
        Ok(started.elapsed())
    }

    pub async fn is_running(&self) -> bool {
        self.health().await.is_ok()
    }

    /// Polls `/health` every `interval` until it answers or `window` elapses.
    pub async fn wait_until_ready(&self, window: Duration, interval: Duration) -> bool {
        let deadline = Instant::now() + window;
        loop {
            if self.is_running().await {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    /// Fetches through the daemon.
    ///
    /// A missing, refusing or silent daemon yields [`FetchError::NotRunning`];
    /// errors the daemon reports keep their kind.
    pub async fn fetch(
        &self,
        url: &str,
        debug: bool,
        timeout: Duration,
    ) -> Result<Article, FetchError> {
        let request = FetchRequest {
            url: url.to_string(),
            debug,
        };
        let body = serde_json::to_vec(&request).map_err(FetchError::transport)?;
        let reply = self.send(Route::Fetch, Bytes::from(body), timeout).await?;
        let payload: FetchResponse = serde_json::from_slice(&reply).map_err(FetchError::transport)?;
        payload.into_result()
    }

    /// Asks the daemon to stop after in-flight work completes.
    pub async fn shutdown(&self) -> Result<(), DaemonError> {
        self.send(Route::Shutdown, Bytes::new(), CONTROL_TIMEOUT).await?;
        Ok(())
    }

    /// [`shutdown`](Self::shutdown), then waits up to `wait` for the socket file to go away.
    pub async fn stop(&self, wait: Duration) -> Result<bool, DaemonError> {
        self.shutdown().await?;
        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            if tokio::fs::symlink_metadata(&self.socket_path).await.is_err() {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(false)
    }
}

fn build_request(route: Route, body: Bytes) -> Request<Full<Bytes>> {
    let has_body = !body.is_empty();
    let mut request = Request::new(Full::new(body));
    *request.method_mut() = route.method();
    *request.uri_mut() = Uri::from_static(route.path());
    let headers = request.headers_mut();
    headers.insert(HOST, HeaderValue::from_static("localhost"));
    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    request
}
