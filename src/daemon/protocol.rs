//! HTTP contract between the daemon and its clients.
//!
//! Plain HTTP/1.1 over the Unix socket, one request per connection:
//!
//! ```text
//! GET  /health     -> 200
//! POST /fetch      {"url":"https://…","debug":false}
//!                  -> 200 {"article":{…}} or {"error":"…","error_type":"paywall"}
//! POST /shutdown   -> 200, then the daemon drains and exits
//! ```
//!
//! Any HTTP client that can dial a Unix socket works, for example
//! `curl --unix-socket serve.sock http://localhost/health`.

use crate::article::Article;
use crate::error::FetchError;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest body either side will read.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub const HEALTH_PATH: &str = "/health";
pub const FETCH_PATH: &str = "/fetch";
pub const SHUTDOWN_PATH: &str = "/shutdown";

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("malformed body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body exceeds {} bytes", MAX_BODY_BYTES)]
    BodyTooLarge,

    #[error("cannot read body: {0}")]
    Body(String),
}

/// Endpoints the daemon serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Fetch,
    Shutdown,
}

impl Route {
    /// Matches a request line, or the status to reject it with.
    pub fn resolve(method: &Method, path: &str) -> Result<Self, StatusCode> {
        let route = match path {
            HEALTH_PATH => Route::Health,
            FETCH_PATH => Route::Fetch,
            SHUTDOWN_PATH => Route::Shutdown,
            _ => return Err(StatusCode::NOT_FOUND),
        };
        if *method != route.method() {
            return Err(StatusCode::METHOD_NOT_ALLOWED);
        }
        Ok(route)
    }

    pub fn method(self) -> Method {
        match self {
            Route::Health => Method::GET,
            Route::Fetch | Route::Shutdown => Method::POST,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Health => HEALTH_PATH,
            Route::Fetch => FETCH_PATH,
            Route::Shutdown => SHUTDOWN_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    #[serde(default)]
    pub debug: bool,
}

/// Body of a `/fetch` reply: an article, or an error with its kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<Article>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_type: String,
}

const ERROR_TYPE_PAYWALL: &str = "paywall";
const ERROR_TYPE_USER: &str = "user";

impl FetchResponse {
    pub fn from_result(result: Result<Article, FetchError>) -> Self {
        match result {
            Ok(article) => Self {
                article: Some(article),
                ..Default::default()
            },
            Err(err) => {
                let error_type = match &err {
                    FetchError::Paywall => ERROR_TYPE_PAYWALL,
                    FetchError::User(_) => ERROR_TYPE_USER,
                    FetchError::NotRunning | FetchError::Transport(_) => "",
                };
                Self {
                    article: None,
                    error: err.to_string(),
                    error_type: error_type.to_string(),
                }
            }
        }
    }

    pub fn into_result(self) -> Result<Article, FetchError> {
        if !self.error.is_empty() {
            return Err(match self.error_type.as_str() {
                ERROR_TYPE_PAYWALL => FetchError::Paywall,
                ERROR_TYPE_USER => FetchError::User(self.error),
                _ => FetchError::Transport(self.error),
            });
        }
        self.article
            .ok_or_else(|| FetchError::Transport("daemon returned empty response".to_string()))
    }
}

/// Collects a whole body, refusing more than [`MAX_BODY_BYTES`].
pub async fn read_body<B>(body: B) -> Result<Bytes, ProtocolError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(ProtocolError::BodyTooLarge),
        Err(e) => Err(ProtocolError::Body(e.to_string())),
    }
}

/// Bodiless response with `status`.
pub fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// `200 OK` carrying `body` as JSON.
pub fn json(body: &impl Serialize) -> Result<Response<Full<Bytes>>, ProtocolError> {
    let mut response = Response::new(Full::new(Bytes::from(serde_json::to_vec(body)?)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    Ok(response)
}
