//! HTTP transport between a game session and the GROT server.

use crate::error::{TransportError, TransportErrorKind};
use crate::strategy::{Move, Snapshot};
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Moves snapshots and moves over the wire.
///
/// A session holds exactly one request in flight, so implementations never
/// see concurrent calls for the same game.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the current game state (`GET {url}`).
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot, TransportError>;

    /// Submits a move and returns the resulting game state (`POST {url}`).
    async fn submit_move(&self, url: &str, mv: &Move) -> Result<Snapshot, TransportError>;
}

/// Builds the shared reqwest client, optionally routed through a proxy.
///
/// Connections are kept alive between turns.
#[instrument]
pub fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .pool_idle_timeout(None)
        .tcp_keepalive(Duration::from_secs(60));

    if let Some(proxy_url) = proxy {
        info!(proxy = %proxy_url, "Routing requests through proxy");
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            error!(error = %e, proxy = %proxy_url, "Invalid proxy URL");
            TransportError::from(e)
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Drops the query string, where the board URL carries the player token.
pub fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// JSON-over-HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport, optionally routed through `proxy`.
    #[instrument]
    pub fn new(proxy: Option<&str>) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client(proxy)?,
        })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    async fn fetch_snapshot(&self, url: &str) -> Result<Snapshot, TransportError> {
        debug!("Fetching snapshot");

        let snapshot = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<Snapshot>()
            .await?;

        debug!("Snapshot received");
        Ok(snapshot)
    }

    #[instrument(skip(self, url, mv), fields(url = %redact_url(url), mv = %mv))]
    async fn submit_move(&self, url: &str, mv: &Move) -> Result<Snapshot, TransportError> {
        debug!("Submitting move");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(mv)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Server rejected move");
            return Err(TransportError::new(
                TransportErrorKind::Status(status.as_u16()),
                format!("Move rejected: {} - {}", status, body),
            ));
        }

        let snapshot = response.json::<Snapshot>().await?;
        debug!("Next snapshot received");
        Ok(snapshot)
    }
}
