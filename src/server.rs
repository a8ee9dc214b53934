//! HTTP/1.1 server for `lingua-cms serve`.
//!
//! A thin adapter: each hyper request becomes a [`CmsRequest`], goes
//! through [`router::respond`], and the [`router::Response`] is written
//! back. Only `GET` and `HEAD` are served.
//!
//! While serving, a background task runs the scheduled-publish sweep on a
//! fixed period, so scheduled records go live without a restart.
//!
//! A request is authenticated (and may therefore use `?preview=true`) when
//! `preview_token` is configured and the request carries
//! `Authorization: Bearer <preview_token>`.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::header::{ALLOW, AUTHORIZATION, CONTENT_TYPE, HeaderMap, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;

use crate::cms::Cms;
use crate::router::{self, CmsRequest};

/// Bind `addr` and serve until the process exits, publishing due records
/// every `publish_every`.
pub async fn serve(cms: Arc<Cms>, addr: SocketAddr, publish_every: Duration) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, ?publish_every, "listening");
    let sweeper = tokio::spawn(publish_scheduled(cms.clone(), publish_every));
    let result = serve_listener(cms, listener).await;
    sweeper.abort();
    result
}

/// Run the scheduled-publish sweep every `every`, starting immediately.
///
/// `every` must be non-zero.
pub async fn publish_scheduled(cms: Arc<Cms>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Err(err) = cms.publish_due(Utc::now()) {
            tracing::warn!(error = %err, "scheduled publish failed");
        }
    }
}

/// Accept connections on an already-bound listener.
pub async fn serve_listener(cms: Arc<Cms>, listener: TcpListener) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let cms = cms.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let cms = cms.clone();
                async move { Ok::<_, Infallible>(handle(&cms, &req)) }
            });
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

/// Answer one request.
pub fn handle<B>(cms: &Cms, req: &Request<B>) -> Response<Full<Bytes>> {
    let method = req.method();
    if method != Method::GET && method != Method::HEAD {
        return build(StatusCode::METHOD_NOT_ALLOWED, None, Some("GET, HEAD"), Bytes::new());
    }

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let authenticated =
        authenticated_from_headers(req.headers(), cms.config().preview_token.as_deref());
    let request = CmsRequest::parse(target, authenticated);
    let response = router::respond(cms, &request);
    tracing::info!(
        %method,
        path = %request.path,
        status = response.status,
        authenticated,
        "request"
    );

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if method == Method::HEAD {
        Bytes::new()
    } else {
        Bytes::from(response.body)
    };
    build(status, response.location.as_deref(), None, body)
}

/// Whether the headers carry the configured preview bearer token.
pub fn authenticated_from_headers(headers: &HeaderMap, preview_token: Option<&str>) -> bool {
    let Some(token) = preview_token.filter(|t| !t.is_empty()) else {
        return false;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|presented| presented.trim() == token)
}

fn build(
    status: StatusCode,
    location: Option<&str>,
    allow: Option<&str>,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html; charset=utf-8");
    if let Some(location) = location {
        builder = builder.header(LOCATION, location);
    }
    if let Some(allow) = allow {
        builder = builder.header(ALLOW, allow);
    }
    builder.body(Full::new(body)).unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid response");
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}
